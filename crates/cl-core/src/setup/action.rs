use serde::{Deserialize, Serialize};

use crate::entry::{EntryData, EntryOptions, NewConfigEntry};
use crate::ids::EntryId;
use crate::ports::{DeviceProbe, PairingHandshake, PairingTarget};

/// Side-effects produced by state transitions.
///
/// 状态迁移产生的副作用。
///
/// Every action except `UpdateEntry`, `ReleaseUniqueId` and `Diagnostic`
/// answers with exactly one follow-up event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupAction {
    /// Reserve a device identity for this flow.
    ClaimUniqueId { unique_id: String },
    /// Drop this flow's identity claim.
    ReleaseUniqueId,
    GuessDeviceClass { host: String },
    ValidateConnection { probe: DeviceProbe },
    StartPairing { target: PairingTarget },
    CompletePairing {
        target: PairingTarget,
        handshake: PairingHandshake,
        pin: String,
    },
    ResolveUniqueId { probe: DeviceProbe },
    /// Answered with `EntryCreated`.
    CreateEntry { entry: NewConfigEntry },
    UpdateEntry {
        entry_id: EntryId,
        data: EntryData,
        options: EntryOptions,
    },
    Diagnostic(SetupDiagnostic),
}

/// Messages for flows nobody watches interactively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupDiagnostic {
    /// Static configuration import failed with these form errors.
    ImportFailed { reasons: Vec<String> },
    /// Static configuration lacks an access token for a TV.
    ImportMissingAccessToken { host: String },
}
