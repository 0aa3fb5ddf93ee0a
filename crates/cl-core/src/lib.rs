//! # cl-core
//!
//! Core domain models and setup logic for castlink.
//!
//! This crate contains pure business logic without any infrastructure dependencies.
//! Device communication and entry persistence are reached only through [`ports`].

// Public module exports
pub mod device;
pub mod entry;
pub mod ids;
pub mod options;
pub mod ports;
pub mod schema;
pub mod settings;
pub mod setup;

// Re-export commonly used types at the crate root
pub use device::DeviceClass;
pub use entry::{ConfigEntry, EntryData, EntryOptions, NewConfigEntry, DOMAIN};
pub use ids::{EntryId, FlowId};
pub use schema::{ConfigInput, DeviceConfig, DiscoveryInfo, ImportConfig};
pub use settings::SetupSettings;
pub use setup::{AbortReason, SetupState, SetupStateMachine, StepId, TriggerSource};
