//! # castlink
//!
//! Setup workflow engine for SmartCast TVs and speakers.
//!
//! The domain lives in `cl-core`, the use cases in `cl-app` and the bundled
//! adapters in `cl-infra`; this crate only assembles them.

pub mod bootstrap;

pub use bootstrap::{init_tracing_subscriber, wire, Castlink};
pub use cl_app::{ImportOutcome, ImportStaticConfig, OptionsFlow, OptionsStep, SetupFlow, SetupFlowError};
pub use cl_core::{ConfigEntry, ConfigInput, DiscoveryInfo, ImportConfig, SetupState};
