use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::device::DeviceClass;
use crate::schema::ConfigSchema;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Knobs of the setup flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupSettings {
    /// Name pre-filled on the configuration form.
    pub default_name: String,
    pub default_device_class: DeviceClass,
    /// Volume step given to entries whose trigger did not carry one.
    pub default_volume_step: u8,
    /// Client identifier announced to the device while pairing.
    pub client_id: String,
}

impl SetupSettings {
    pub fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(self.default_name.clone(), self.default_device_class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence.
    pub filter: Option<String>,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub setup: SetupSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

fn current_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}
