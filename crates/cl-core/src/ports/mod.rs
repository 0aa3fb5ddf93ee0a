//! Port interfaces for the application layer
//!
//! Ports define the contract between the setup use cases and the external
//! collaborators they drive: the vendor device client and the host's
//! configuration-entry store. Neither is implemented in this crate.

pub mod device_client;
pub mod entry_store;
pub mod errors;

pub use device_client::{DeviceClientPort, DeviceProbe, PairingHandshake, PairingTarget};
pub use entry_store::{EntryStorePort, UniqueIdClaim};
pub use errors::EntryStoreError;
