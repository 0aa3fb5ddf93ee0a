//! Device-level value objects shared by the setup and options flows.

mod class;
mod host;

pub use class::{DeviceClass, UnknownDeviceClass};
pub use host::{bare_host, host_is_same, host_with_port};
