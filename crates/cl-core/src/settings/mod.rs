pub mod defaults;
pub mod model;

pub use model::{LoggingSettings, SetupSettings, Settings, CURRENT_SCHEMA_VERSION};
