use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::device::DeviceClass;

/// Connection details used for reachability checks and identity lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProbe {
    pub host: String,
    pub access_token: Option<String>,
    pub device_class: DeviceClass,
}

/// Device a pairing handshake is performed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingTarget {
    /// Identifier this client announces to the device.
    pub client_id: String,
    pub host: String,
    pub name: String,
    pub device_class: DeviceClass,
}

/// Opaque handshake state returned when pairing starts.
///
/// The device shows a PIN; completing the handshake needs both values plus
/// that PIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingHandshake {
    pub channel_type: u32,
    pub token: u32,
}

/// Vendor device client.
///
/// Timeouts are the client's responsibility; it reports them as a negative
/// answer or an error, both of which the setup flow treats as a connection
/// failure.
#[async_trait]
pub trait DeviceClientPort: Send + Sync {
    /// Guess whether the device at `host` is a TV or a speaker.
    async fn guess_device_class(&self, host: &str) -> Result<DeviceClass>;

    /// Check that the device is reachable with the given credentials.
    async fn validate(&self, probe: &DeviceProbe) -> Result<bool>;

    /// Stable identifier of the device, `None` when it cannot be determined.
    async fn compute_unique_id(&self, probe: &DeviceProbe) -> Result<Option<String>>;

    /// Put the device into pairing mode. `None` means the device refused.
    async fn start_pairing(&self, target: &PairingTarget) -> Result<Option<PairingHandshake>>;

    /// Finish pairing with the PIN shown on the device and return the
    /// access token, or `None` when the PIN was rejected.
    async fn complete_pairing(
        &self,
        target: &PairingTarget,
        handshake: &PairingHandshake,
        pin: &str,
    ) -> Result<Option<String>>;
}
