//! Static device configuration.
//!
//! Devices can be declared up front in a TOML file and imported on startup:
//!
//! ```toml
//! [[devices]]
//! name = "Living Room"
//! host = "192.168.1.20:7345"
//! device_class = "tv"
//! access_token = "Z1a2b3c4"
//! volume_step = 2
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::debug;

use cl_core::entry::{MAX_VOLUME_STEP, MIN_VOLUME_STEP};
use cl_core::ImportConfig;

#[derive(Debug, Default, Deserialize)]
struct StaticConfigFile {
    #[serde(default)]
    devices: Vec<ImportConfig>,
}

/// Parse a static configuration document.
pub fn parse_static_config(content: &str) -> Result<Vec<ImportConfig>> {
    let file: StaticConfigFile = toml::from_str(content).context("parse static config failed")?;

    for (index, device) in file.devices.iter().enumerate() {
        if device.host.trim().is_empty() {
            bail!("device #{index}: host must not be empty");
        }
        if !(MIN_VOLUME_STEP..=MAX_VOLUME_STEP).contains(&device.volume_step) {
            bail!(
                "device #{index} ({}): volume_step must be between {MIN_VOLUME_STEP} and {MAX_VOLUME_STEP}, got {}",
                device.host,
                device.volume_step
            );
        }
    }

    Ok(file.devices)
}

/// Load the devices declared in `path`. A missing file declares no devices.
pub async fn load_static_config(path: impl AsRef<Path>) -> Result<Vec<ImportConfig>> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no static config file");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("read static config failed: {}", path.display()))
        }
    };

    parse_static_config(&content)
        .with_context(|| format!("invalid static config: {}", path.display()))
}
