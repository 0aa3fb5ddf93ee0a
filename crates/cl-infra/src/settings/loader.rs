use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use tracing::warn;

use cl_core::settings::{Settings, CURRENT_SCHEMA_VERSION};

/// Prefix of environment variables overriding file settings,
/// e.g. `CASTLINK_SETUP__CLIENT_ID`.
pub const ENV_PREFIX: &str = "CASTLINK";

/// Load settings from an optional TOML file layered with environment
/// variables. Anything not set falls back to [`Settings::default`].
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let settings: Settings = builder
        .build()
        .context("build settings failed")?
        .try_deserialize()
        .context("deserialize settings failed")?;

    if settings.schema_version > CURRENT_SCHEMA_VERSION {
        warn!(
            schema_version = settings.schema_version,
            supported = CURRENT_SCHEMA_VERSION,
            "settings written by a newer version; unknown keys are ignored"
        );
    }

    Ok(settings)
}
