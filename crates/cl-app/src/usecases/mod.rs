pub mod import_static_config;
pub mod options;
pub mod setup;

pub use import_static_config::{ImportOutcome, ImportStaticConfig};
pub use options::{OptionsFlow, OptionsStep};
pub use setup::{SetupFlow, SetupFlowError};
