use serde::{Deserialize, Serialize};

use crate::schema::{ConfigInput, DeviceConfig, DiscoveryInfo};

use super::form::{SetupForm, StepId};

/// Origin of a setup flow. Alters branching, never the stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    #[default]
    User,
    Import,
    Discovery,
}

/// Why a flow ended without creating an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// The device is already configured, or another flow is handling it.
    AlreadySetup,
    /// An imported device matched an entry and the entry was updated.
    UpdatedEntry,
    /// The device identity is taken by an entry or an in-progress flow.
    AlreadyConfigured,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortReason::AlreadySetup => "already_setup",
            AbortReason::UpdatedEntry => "updated_entry",
            AbortReason::AlreadyConfigured => "already_configured",
        }
    }
}

/// Setup flow state.
///
/// 设置流程状态。
///
/// `ShowForm` waits for user input; the `*ing` states wait for the result of
/// the action emitted with them; `Created` and `Aborted` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupState {
    /// Flow not started yet.
    Idle,
    /// A form is displayed.
    ///
    /// 等待用户输入。
    ShowForm(SetupForm),
    /// Discovery: waiting for the provisional identity claim.
    ClaimingDiscoveryId { discovery: DiscoveryInfo },
    /// Discovery: waiting for the device class guess.
    GuessingDeviceClass { input: ConfigInput },
    /// Waiting for the reachability check.
    ValidatingConnection { config: DeviceConfig },
    /// Waiting for the device to enter pairing mode.
    StartingPairing { config: DeviceConfig },
    /// Waiting for the device to accept the PIN.
    CompletingPairing { pin: String },
    /// Waiting for the device identity lookup.
    ResolvingUniqueId { config: DeviceConfig },
    /// Waiting for the device identity claim.
    ClaimingUniqueId {
        config: DeviceConfig,
        unique_id: String,
    },
    /// Waiting for the store to create the entry.
    CreatingEntry { title: String, unique_id: String },
    /// Entry created.
    ///
    /// 已创建配置项（终态）。
    Created { title: String, unique_id: String },
    /// Flow ended without creating an entry.
    ///
    /// 流程中止（终态）。
    Aborted { reason: AbortReason },
}

impl SetupState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SetupState::Created { .. } | SetupState::Aborted { .. })
    }

    pub fn form(&self) -> Option<&SetupForm> {
        match self {
            SetupState::ShowForm(form) => Some(form),
            _ => None,
        }
    }

    pub fn step_id(&self) -> Option<StepId> {
        self.form().map(|form| form.step_id)
    }

    /// Short label for logs; never includes credentials.
    pub fn label(&self) -> &'static str {
        match self {
            SetupState::Idle => "idle",
            SetupState::ShowForm(form) => form.step_id.as_str(),
            SetupState::ClaimingDiscoveryId { .. } => "claiming_discovery_id",
            SetupState::GuessingDeviceClass { .. } => "guessing_device_class",
            SetupState::ValidatingConnection { .. } => "validating_connection",
            SetupState::StartingPairing { .. } => "starting_pairing",
            SetupState::CompletingPairing { .. } => "completing_pairing",
            SetupState::ResolvingUniqueId { .. } => "resolving_unique_id",
            SetupState::ClaimingUniqueId { .. } => "claiming_unique_id",
            SetupState::CreatingEntry { .. } => "creating_entry",
            SetupState::Created { .. } => "created",
            SetupState::Aborted { .. } => "aborted",
        }
    }
}
