use super::model::*;
use crate::device::DeviceClass;
use crate::entry::DEFAULT_VOLUME_STEP;
use crate::schema::DEFAULT_NAME;

/// Client identifier used when pairing, unless configured otherwise.
pub const DEFAULT_CLIENT_ID: &str = "castlink";

impl Default for SetupSettings {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_NAME.to_string(),
            default_device_class: DeviceClass::Tv,
            default_volume_step: DEFAULT_VOLUME_STEP,
            client_id: DEFAULT_CLIENT_ID.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: None,
            directory: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            setup: SetupSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
