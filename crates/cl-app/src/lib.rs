//! # cl-app
//!
//! Use cases driving the setup state machine against the device client and
//! entry store ports.

pub mod usecases;

pub use usecases::{
    ImportOutcome, ImportStaticConfig, OptionsFlow, OptionsStep, SetupFlow, SetupFlowError,
};
