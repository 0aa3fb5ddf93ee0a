use serde::{Deserialize, Serialize};

use crate::device::DeviceClass;
use crate::ports::{PairingHandshake, UniqueIdClaim};
use crate::schema::{ConfigInput, DiscoveryInfo, ImportConfig};

/// Events that drive the setup flow.
///
/// 驱动设置流程的事件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupEvent {
    // Entry points
    StartUser { input: Option<ConfigInput> },
    StartImport { config: ImportConfig },
    StartDiscovery { discovery: DiscoveryInfo },

    // User input
    SubmitUser { input: ConfigInput },
    SubmitPin { pin: Option<String> },
    ConfirmPairing,

    // Results (from orchestrator)
    UniqueIdClaimed { outcome: UniqueIdClaim },
    DeviceClassGuessed { device_class: DeviceClass },
    ConnectionValidated { valid: bool },
    PairingStarted { handshake: Option<PairingHandshake> },
    PairingCompleted { access_token: Option<String> },
    UniqueIdResolved { unique_id: Option<String> },
    /// `false` when the store refused the entry as a duplicate.
    EntryCreated { created: bool },
}

impl SetupEvent {
    /// Short label for logs; never includes credentials or PINs.
    pub fn label(&self) -> &'static str {
        match self {
            SetupEvent::StartUser { .. } => "start_user",
            SetupEvent::StartImport { .. } => "start_import",
            SetupEvent::StartDiscovery { .. } => "start_discovery",
            SetupEvent::SubmitUser { .. } => "submit_user",
            SetupEvent::SubmitPin { .. } => "submit_pin",
            SetupEvent::ConfirmPairing => "confirm_pairing",
            SetupEvent::UniqueIdClaimed { .. } => "unique_id_claimed",
            SetupEvent::DeviceClassGuessed { .. } => "device_class_guessed",
            SetupEvent::ConnectionValidated { .. } => "connection_validated",
            SetupEvent::PairingStarted { .. } => "pairing_started",
            SetupEvent::PairingCompleted { .. } => "pairing_completed",
            SetupEvent::UniqueIdResolved { .. } => "unique_id_resolved",
            SetupEvent::EntryCreated { .. } => "entry_created",
        }
    }
}
