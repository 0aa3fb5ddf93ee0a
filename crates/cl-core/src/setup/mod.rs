//! Setup domain module.
//!
//! This module defines the device setup state machine types.

pub mod action;
pub mod event;
pub mod form;
pub mod state;
pub mod state_machine;

pub use action::{SetupAction, SetupDiagnostic};
pub use event::SetupEvent;
pub use form::{FormSchema, SetupForm, StepId};
pub use state::{AbortReason, SetupState, TriggerSource};
pub use state_machine::SetupStateMachine;
