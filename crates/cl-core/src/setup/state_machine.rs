//! Setup state machine.
//!
//! 设备配置流程的显式状态机。
//!
//! # Design Principles / 设计原则
//!
//! - **显式状态**: every wait on the outside world has its own [`SetupState`]
//! - **纯函数**: `(state, event, entries) -> (new_state, actions[])`, no I/O
//! - **可测试**: the orchestrator executes [`SetupAction`]s and feeds their
//!   results back as [`SetupEvent`]s, so tests can drive the machine directly
//!
//! `entries` is the snapshot of existing entries taken for the current step.
//! Events that do not apply to the current state leave it unchanged.

use crate::device::{bare_host, host_is_same, host_with_port, DeviceClass};
use crate::entry::{ConfigEntry, EntryOptions, NewConfigEntry, DOMAIN};
use crate::ports::{DeviceProbe, PairingHandshake, PairingTarget, UniqueIdClaim};
use crate::schema::{
    strip_service_type, ConfigInput, DeviceConfig, DiscoveryInfo, FormErrorCode, FormErrors,
    FormField, ImportConfig,
};
use crate::settings::SetupSettings;

use super::action::{SetupAction, SetupDiagnostic};
use super::event::SetupEvent;
use super::form::{SetupForm, StepId};
use super::state::{AbortReason, SetupState, TriggerSource};

type Transition = (SetupState, Vec<SetupAction>);

/// Data accumulated across steps of one flow.
#[derive(Debug, Clone, Default)]
struct FlowContext {
    source: TriggerSource,
    /// Forces a confirmation form before proceeding automatically.
    must_show_form: bool,
    /// Last raw input, used to re-populate the configuration form.
    form_defaults: Option<ConfigInput>,
    /// Validated config waiting for pairing / finalization.
    pending: Option<DeviceConfig>,
    handshake: Option<PairingHandshake>,
}

/// Setup state machine.
///
/// 维护一个配置流程的状态，并根据事件产生状态转换和动作。
///
/// # Example / 示例
///
/// ```
/// use cl_core::setup::{SetupEvent, SetupState, SetupStateMachine};
/// use cl_core::SetupSettings;
///
/// let mut sm = SetupStateMachine::new(SetupSettings::default());
/// let (state, actions) = sm.handle_event(SetupEvent::StartUser { input: None }, &[]);
/// assert!(matches!(state, SetupState::ShowForm(_)));
/// assert!(actions.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SetupStateMachine {
    state: SetupState,
    context: FlowContext,
    settings: SetupSettings,
}

impl SetupStateMachine {
    pub fn new(settings: SetupSettings) -> Self {
        Self {
            state: SetupState::Idle,
            context: FlowContext::default(),
            settings,
        }
    }

    pub fn state(&self) -> &SetupState {
        &self.state
    }

    pub fn source(&self) -> TriggerSource {
        self.context.source
    }

    /// Apply `event` and return the new state with the actions to execute.
    pub fn handle_event(&mut self, event: SetupEvent, entries: &[ConfigEntry]) -> Transition {
        let current = std::mem::replace(&mut self.state, SetupState::Idle);
        let (next, actions) = self.transition(current, event, entries);

        if next.is_terminal() {
            // Pairing state only lives as long as the flow.
            self.context = FlowContext {
                source: self.context.source,
                ..FlowContext::default()
            };
        }

        self.state = next.clone();
        (next, actions)
    }

    fn transition(
        &mut self,
        state: SetupState,
        event: SetupEvent,
        entries: &[ConfigEntry],
    ) -> Transition {
        match (state, event) {
            (SetupState::Idle, SetupEvent::StartUser { input }) => {
                self.context.source = TriggerSource::User;
                match input {
                    Some(input) => self.step_user(input, entries),
                    None => (self.user_form(FormErrors::default()), Vec::new()),
                }
            }
            (SetupState::Idle, SetupEvent::StartImport { config }) => {
                self.step_import(config, entries)
            }
            (SetupState::Idle, SetupEvent::StartDiscovery { discovery }) => {
                self.context.source = TriggerSource::Discovery;
                // Claimed early so the device is not rediscovered by another flow.
                let unique_id = bare_host(&discovery.host).to_string();
                (
                    SetupState::ClaimingDiscoveryId { discovery },
                    vec![SetupAction::ClaimUniqueId { unique_id }],
                )
            }
            (
                SetupState::ClaimingDiscoveryId { discovery },
                SetupEvent::UniqueIdClaimed { outcome },
            ) => self.step_discovery(discovery, outcome, entries),
            (
                SetupState::GuessingDeviceClass { mut input },
                SetupEvent::DeviceClassGuessed { device_class },
            ) => {
                input.device_class = Some(device_class.as_str().to_string());
                self.context.must_show_form = true;
                self.step_user(input, entries)
            }
            (SetupState::ShowForm(form), SetupEvent::SubmitUser { input })
                if form.step_id == StepId::User =>
            {
                self.step_user(input, entries)
            }
            (
                SetupState::ValidatingConnection { config },
                SetupEvent::ConnectionValidated { valid },
            ) => {
                if valid {
                    self.finalize(config)
                } else {
                    self.redisplay_user(FormErrors::single(
                        FormField::Base,
                        FormErrorCode::CantConnect,
                    ))
                }
            }
            (SetupState::StartingPairing { config }, SetupEvent::PairingStarted { handshake }) => {
                match handshake {
                    Some(handshake) => {
                        self.context.handshake = Some(handshake);
                        // Phase B right away, without a PIN yet.
                        self.step_pair_tv(None)
                    }
                    // Back to the connection details, not a blind retry.
                    None => (
                        self.config_form(
                            &config,
                            FormErrors::single(FormField::Base, FormErrorCode::CantConnect),
                        ),
                        Vec::new(),
                    ),
                }
            }
            (SetupState::ShowForm(form), SetupEvent::SubmitPin { pin })
                if form.step_id == StepId::PairTv =>
            {
                self.step_pair_tv(pin)
            }
            (
                SetupState::CompletingPairing { pin },
                SetupEvent::PairingCompleted { access_token },
            ) => match access_token {
                Some(access_token) => {
                    if let Some(pending) = self.context.pending.as_mut() {
                        pending.access_token = Some(access_token);
                    }
                    self.context.must_show_form = true;
                    let step_id = if self.context.source == TriggerSource::Import {
                        StepId::PairingCompleteImport
                    } else {
                        StepId::PairingComplete
                    };
                    self.step_pairing_complete(step_id)
                }
                None => (
                    SetupState::ShowForm(SetupForm::pair_tv(
                        pin,
                        FormErrors::single(FormField::Pin, FormErrorCode::CompletePairingFailed),
                    )),
                    Vec::new(),
                ),
            },
            (SetupState::ShowForm(form), SetupEvent::ConfirmPairing)
                if matches!(
                    form.step_id,
                    StepId::PairingComplete | StepId::PairingCompleteImport
                ) =>
            {
                self.step_pairing_complete(form.step_id)
            }
            (
                SetupState::ResolvingUniqueId { config },
                SetupEvent::UniqueIdResolved { unique_id },
            ) => match unique_id {
                Some(unique_id) if has_unique_id(entries, &unique_id) => {
                    self.abort(AbortReason::AlreadyConfigured)
                }
                Some(unique_id) => (
                    SetupState::ClaimingUniqueId {
                        config,
                        unique_id: unique_id.clone(),
                    },
                    vec![SetupAction::ClaimUniqueId { unique_id }],
                ),
                None => {
                    // A resubmission has to pair again from scratch.
                    self.context.handshake = None;
                    (
                        self.config_form(
                            &config,
                            FormErrors::single(FormField::Base, FormErrorCode::CantConnect),
                        ),
                        Vec::new(),
                    )
                }
            },
            (
                SetupState::ClaimingUniqueId { config, unique_id },
                SetupEvent::UniqueIdClaimed { outcome },
            ) => match outcome {
                // Another flow may have created the entry since the identity
                // was resolved.
                UniqueIdClaim::Claimed if has_unique_id(entries, &unique_id) => {
                    self.abort(AbortReason::AlreadyConfigured)
                }
                UniqueIdClaim::Claimed => self.create_entry(config, unique_id),
                UniqueIdClaim::AlreadyInProgress => self.abort(AbortReason::AlreadyConfigured),
            },
            (
                SetupState::CreatingEntry { title, unique_id },
                SetupEvent::EntryCreated { created },
            ) => {
                if created {
                    (
                        SetupState::Created { title, unique_id },
                        vec![SetupAction::ReleaseUniqueId],
                    )
                } else {
                    self.abort(AbortReason::AlreadyConfigured)
                }
            }
            (state, event) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    state = state.label(),
                    event = event.label(),
                    "setup event ignored in current state"
                );
                let _ = event;
                (state, Vec::new())
            }
        }
    }

    fn step_user(&mut self, input: ConfigInput, entries: &[ConfigEntry]) -> Transition {
        let schema = self.settings.config_schema();
        self.context.form_defaults = Some(input.clone());

        let conflicts = schema.conflicts(&input, entries);
        let errors = match schema.validate(&input) {
            Ok(config) if conflicts.is_empty() => return self.on_valid_config(config),
            Ok(_) => conflicts,
            Err(mut errors) => {
                errors.merge(conflicts);
                errors
            }
        };

        self.redisplay_user(errors)
    }

    fn on_valid_config(&mut self, config: DeviceConfig) -> Transition {
        let source = self.context.source;

        if self.context.must_show_form && source == TriggerSource::Discovery {
            // Discovered devices are always confirmed by the user first.
            self.context.must_show_form = false;
            return (self.user_form(FormErrors::default()), Vec::new());
        }

        if config.device_class == DeviceClass::Speaker || config.access_token.is_some() {
            let probe = probe_for(&config);
            return (
                SetupState::ValidatingConnection { config },
                vec![SetupAction::ValidateConnection { probe }],
            );
        }

        if self.context.must_show_form && source == TriggerSource::Import {
            // Let the user add a token or continue with pairing.
            self.context.must_show_form = false;
            return (
                self.user_form(FormErrors::default()),
                vec![SetupAction::Diagnostic(
                    SetupDiagnostic::ImportMissingAccessToken { host: config.host },
                )],
            );
        }

        self.context.pending = Some(config.clone());
        self.enter_pair_tv(config)
    }

    fn step_import(&mut self, config: ImportConfig, entries: &[ConfigEntry]) -> Transition {
        self.context.source = TriggerSource::Import;

        let Some(entry) = entries
            .iter()
            .find(|entry| host_is_same(&entry.data.host, &config.host))
        else {
            self.context.must_show_form = true;
            return self.step_user(config.to_input(), entries);
        };

        let mut data = entry.data.clone();
        let mut options = entry.options;
        let mut changed = false;
        let mut actions = Vec::new();

        if entry.data.name != config.name {
            let name_taken = entries
                .iter()
                .any(|other| other.entry_id != entry.entry_id && other.data.name == config.name);
            if name_taken {
                actions.push(SetupAction::Diagnostic(SetupDiagnostic::ImportFailed {
                    reasons: vec![FormErrorCode::NameExists.as_str().to_string()],
                }));
            } else {
                data.name = config.name.clone();
                changed = true;
            }
        }

        // Stored values are clamped; compare like with like.
        let imported = EntryOptions::new(config.volume_step);
        if entry.data.volume_step != Some(imported.volume_step) {
            data.volume_step = Some(imported.volume_step);
            options = imported;
            changed = true;
        }

        if !changed {
            let (state, abort_actions) = self.abort(AbortReason::AlreadySetup);
            actions.extend(abort_actions);
            return (state, actions);
        }

        actions.push(SetupAction::UpdateEntry {
            entry_id: entry.entry_id.clone(),
            data,
            options,
        });
        let (state, abort_actions) = self.abort(AbortReason::UpdatedEntry);
        actions.extend(abort_actions);
        (state, actions)
    }

    fn step_discovery(
        &mut self,
        discovery: DiscoveryInfo,
        outcome: UniqueIdClaim,
        entries: &[ConfigEntry],
    ) -> Transition {
        if outcome == UniqueIdClaim::AlreadyInProgress {
            return self.abort(AbortReason::AlreadySetup);
        }

        let host = host_with_port(&discovery.host, discovery.port);
        if entries
            .iter()
            .any(|entry| host_is_same(&entry.data.host, &host))
        {
            return self.abort(AbortReason::AlreadySetup);
        }

        let input = ConfigInput {
            name: Some(strip_service_type(&discovery.name, &discovery.service_type)),
            host: Some(host.clone()),
            ..ConfigInput::default()
        };
        (
            SetupState::GuessingDeviceClass { input },
            vec![SetupAction::GuessDeviceClass { host }],
        )
    }

    fn enter_pair_tv(&mut self, config: DeviceConfig) -> Transition {
        if self.context.handshake.is_some() {
            return self.step_pair_tv(None);
        }

        let target = self.pairing_target(&config);
        (
            SetupState::StartingPairing { config },
            vec![SetupAction::StartPairing { target }],
        )
    }

    fn step_pair_tv(&mut self, pin: Option<String>) -> Transition {
        let Some(pending) = self.context.pending.clone() else {
            return (self.user_form(FormErrors::default()), Vec::new());
        };
        let Some(handshake) = self.context.handshake else {
            return self.enter_pair_tv(pending);
        };

        match pin.filter(|pin| !pin.is_empty()) {
            Some(pin) => {
                let target = self.pairing_target(&pending);
                (
                    SetupState::CompletingPairing { pin: pin.clone() },
                    vec![SetupAction::CompletePairing {
                        target,
                        handshake,
                        pin,
                    }],
                )
            }
            None => (
                SetupState::ShowForm(SetupForm::pair_tv("", FormErrors::default())),
                Vec::new(),
            ),
        }
    }

    fn step_pairing_complete(&mut self, step_id: StepId) -> Transition {
        let Some(pending) = self.context.pending.clone() else {
            return (self.user_form(FormErrors::default()), Vec::new());
        };

        if self.context.must_show_form {
            self.context.must_show_form = false;
            let access_token = pending.access_token.clone().unwrap_or_default();
            return (
                SetupState::ShowForm(SetupForm::pairing_complete(step_id, &access_token)),
                Vec::new(),
            );
        }

        self.finalize(pending)
    }

    fn finalize(&mut self, config: DeviceConfig) -> Transition {
        let probe = probe_for(&config);
        (
            SetupState::ResolvingUniqueId { config },
            vec![SetupAction::ResolveUniqueId { probe }],
        )
    }

    fn create_entry(&mut self, config: DeviceConfig, unique_id: String) -> Transition {
        let volume_step = config
            .volume_step
            .unwrap_or(self.settings.default_volume_step);
        let entry = NewConfigEntry {
            domain: DOMAIN.to_string(),
            title: config.name.clone(),
            unique_id: Some(unique_id.clone()),
            data: config.to_entry_data(),
            options: EntryOptions::new(volume_step),
        };

        (
            SetupState::CreatingEntry {
                title: config.name,
                unique_id,
            },
            vec![SetupAction::CreateEntry { entry }],
        )
    }

    fn abort(&mut self, reason: AbortReason) -> Transition {
        (
            SetupState::Aborted { reason },
            vec![SetupAction::ReleaseUniqueId],
        )
    }

    /// Redisplay the configuration form; imports also get a diagnostic since
    /// nobody sees their form.
    fn redisplay_user(&self, errors: FormErrors) -> Transition {
        let mut actions = Vec::new();
        if !errors.is_empty() && self.context.source == TriggerSource::Import {
            actions.push(SetupAction::Diagnostic(SetupDiagnostic::ImportFailed {
                reasons: errors.reasons().into_iter().map(String::from).collect(),
            }));
        }
        (self.user_form(errors), actions)
    }

    fn user_form(&self, errors: FormErrors) -> SetupState {
        let defaults = self
            .settings
            .config_schema()
            .defaults_for(self.context.form_defaults.as_ref());
        SetupState::ShowForm(SetupForm::user(defaults, errors))
    }

    fn config_form(&self, config: &DeviceConfig, errors: FormErrors) -> SetupState {
        let defaults = self
            .settings
            .config_schema()
            .defaults_for(Some(&config.to_input()));
        SetupState::ShowForm(SetupForm::user(defaults, errors))
    }

    fn pairing_target(&self, config: &DeviceConfig) -> PairingTarget {
        PairingTarget {
            client_id: self.settings.client_id.clone(),
            host: config.host.clone(),
            name: config.name.clone(),
            device_class: config.device_class,
        }
    }
}

fn has_unique_id(entries: &[ConfigEntry], unique_id: &str) -> bool {
    entries
        .iter()
        .any(|entry| entry.unique_id.as_deref() == Some(unique_id))
}

fn probe_for(config: &DeviceConfig) -> DeviceProbe {
    DeviceProbe {
        host: config.host.clone(),
        access_token: config.access_token.clone(),
        device_class: config.device_class,
    }
}
