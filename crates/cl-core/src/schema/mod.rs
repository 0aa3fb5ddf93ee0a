//! Input payloads, form errors and the configuration schema.

mod config_schema;
mod errors;
mod input;

pub use config_schema::{ConfigFormDefaults, ConfigSchema, DeviceConfig};
pub use errors::{FormErrorCode, FormErrors, FormField};
pub use input::{strip_service_type, ConfigInput, DiscoveryInfo, ImportConfig};

/// Name offered when the user or the trigger did not supply one.
pub const DEFAULT_NAME: &str = "SmartCast";
