//! Setup orchestrator.
//!
//! This module coordinates the setup state machine and side effects.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use cl_core::{
    ports::{DeviceClientPort, EntryStoreError, EntryStorePort, UniqueIdClaim},
    schema::{ConfigInput, DiscoveryInfo, ImportConfig},
    settings::SetupSettings,
    setup::{SetupAction, SetupDiagnostic, SetupEvent, SetupState},
    DeviceClass, FlowId, DOMAIN,
};

use super::context::SetupContext;

/// Errors produced by the setup flow.
///
/// Device failures never surface here; they are answered as negative results
/// and shown on the form instead.
#[derive(Debug, thiserror::Error)]
pub enum SetupFlowError {
    #[error("entry store failed: {0}")]
    Store(#[from] EntryStoreError),
}

/// One setup flow, from trigger to created entry or abort.
///
/// Every public method is one external input; it runs the state machine and
/// all resulting device and store calls before returning the state to show.
pub struct SetupFlow {
    flow_id: FlowId,
    context: Arc<SetupContext>,
    device_client: Arc<dyn DeviceClientPort>,
    entry_store: Arc<dyn EntryStorePort>,
}

impl SetupFlow {
    pub fn new(
        device_client: Arc<dyn DeviceClientPort>,
        entry_store: Arc<dyn EntryStorePort>,
        settings: SetupSettings,
    ) -> Self {
        Self {
            flow_id: FlowId::new(),
            context: SetupContext::new(settings).arc(),
            device_client,
            entry_store,
        }
    }

    pub fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    pub async fn start_from_user(
        &self,
        input: Option<ConfigInput>,
    ) -> Result<SetupState, SetupFlowError> {
        self.dispatch(SetupEvent::StartUser { input }).await
    }

    pub async fn start_from_import(
        &self,
        config: ImportConfig,
    ) -> Result<SetupState, SetupFlowError> {
        self.dispatch(SetupEvent::StartImport { config }).await
    }

    pub async fn start_from_discovery(
        &self,
        discovery: DiscoveryInfo,
    ) -> Result<SetupState, SetupFlowError> {
        self.dispatch(SetupEvent::StartDiscovery { discovery }).await
    }

    pub async fn submit_user(&self, input: ConfigInput) -> Result<SetupState, SetupFlowError> {
        self.dispatch(SetupEvent::SubmitUser { input }).await
    }

    pub async fn submit_pin(&self, pin: Option<String>) -> Result<SetupState, SetupFlowError> {
        self.dispatch(SetupEvent::SubmitPin { pin }).await
    }

    pub async fn confirm_pairing(&self) -> Result<SetupState, SetupFlowError> {
        self.dispatch(SetupEvent::ConfirmPairing).await
    }

    pub async fn state(&self) -> SetupState {
        self.context.get_state().await
    }

    /// Abandon the flow and drop any identity it still holds.
    pub async fn close(&self) -> Result<(), SetupFlowError> {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        self.entry_store.release_unique_id(&self.flow_id).await?;
        debug!(flow_id = %self.flow_id, "setup flow closed");
        Ok(())
    }

    async fn dispatch(&self, event: SetupEvent) -> Result<SetupState, SetupFlowError> {
        // Serialize inputs of this flow; other flows only share the store.
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let span = info_span!(
            "usecase.setup_flow.dispatch",
            flow_id = %self.flow_id,
            event = event.label()
        );
        async {
            let mut entries = self.entry_store.list_entries(DOMAIN).await?;
            let mut machine = self.context.snapshot().await;
            let mut pending_events = vec![event];

            while let Some(event) = pending_events.pop() {
                if matches!(
                    event,
                    SetupEvent::UniqueIdClaimed {
                        outcome: UniqueIdClaim::Claimed
                    }
                ) {
                    // Other flows may have finished while the device was queried.
                    entries = self.entry_store.list_entries(DOMAIN).await?;
                }
                let from = machine.state().label();
                let event_name = event.label();
                let (next, actions) = machine.handle_event(event, &entries);
                info!(from, to = next.label(), event = event_name, "setup state transition");
                let follow_up_events = self.execute_actions(actions).await?;
                pending_events.extend(follow_up_events);
            }

            let state = machine.state().clone();
            self.context.commit(machine).await;
            Ok(state)
        }
        .instrument(span)
        .await
    }

    async fn execute_actions(
        &self,
        actions: Vec<SetupAction>,
    ) -> Result<Vec<SetupEvent>, SetupFlowError> {
        let mut follow_up_events = Vec::new();
        for action in actions {
            match action {
                SetupAction::ClaimUniqueId { unique_id } => {
                    let outcome = self
                        .entry_store
                        .claim_unique_id(&self.flow_id, &unique_id)
                        .await?;
                    debug!(unique_id = %unique_id, ?outcome, "setup action ClaimUniqueId completed");
                    follow_up_events.push(SetupEvent::UniqueIdClaimed { outcome });
                }
                SetupAction::ReleaseUniqueId => {
                    if let Err(err) = self.entry_store.release_unique_id(&self.flow_id).await {
                        warn!(error = %err, "failed to release unique id claim");
                    }
                }
                SetupAction::GuessDeviceClass { host } => {
                    let device_class = self
                        .device_client
                        .guess_device_class(&host)
                        .await
                        .unwrap_or_else(|err| {
                            warn!(error = %err, host = %host, "device class guess failed");
                            DeviceClass::Tv
                        });
                    follow_up_events.push(SetupEvent::DeviceClassGuessed { device_class });
                }
                SetupAction::ValidateConnection { probe } => {
                    let valid = self
                        .device_client
                        .validate(&probe)
                        .await
                        .unwrap_or_else(|err| {
                            warn!(error = %err, host = %probe.host, "connection validation failed");
                            false
                        });
                    follow_up_events.push(SetupEvent::ConnectionValidated { valid });
                }
                SetupAction::StartPairing { target } => {
                    let handshake = self
                        .device_client
                        .start_pairing(&target)
                        .await
                        .unwrap_or_else(|err| {
                            warn!(error = %err, host = %target.host, "start pairing failed");
                            None
                        });
                    follow_up_events.push(SetupEvent::PairingStarted { handshake });
                }
                SetupAction::CompletePairing {
                    target,
                    handshake,
                    pin,
                } => {
                    let access_token = self
                        .device_client
                        .complete_pairing(&target, &handshake, &pin)
                        .await
                        .unwrap_or_else(|err| {
                            warn!(error = %err, host = %target.host, "complete pairing failed");
                            None
                        });
                    follow_up_events.push(SetupEvent::PairingCompleted { access_token });
                }
                SetupAction::ResolveUniqueId { probe } => {
                    let unique_id = self
                        .device_client
                        .compute_unique_id(&probe)
                        .await
                        .unwrap_or_else(|err| {
                            warn!(error = %err, host = %probe.host, "unique id lookup failed");
                            None
                        });
                    follow_up_events.push(SetupEvent::UniqueIdResolved { unique_id });
                }
                SetupAction::CreateEntry { entry } => {
                    match self.entry_store.create_entry(entry).await {
                        Ok(created) => {
                            info!(
                                entry_id = %created.entry_id,
                                title = %created.title,
                                "config entry created"
                            );
                            follow_up_events.push(SetupEvent::EntryCreated { created: true });
                        }
                        Err(EntryStoreError::Conflict(reason)) => {
                            warn!(reason = %reason, "config entry refused as duplicate");
                            follow_up_events.push(SetupEvent::EntryCreated { created: false });
                        }
                        Err(err) => {
                            // The flow state is not committed; do not keep the identity.
                            if let Err(release_err) =
                                self.entry_store.release_unique_id(&self.flow_id).await
                            {
                                warn!(error = %release_err, "failed to release unique id claim");
                            }
                            return Err(err.into());
                        }
                    }
                }
                SetupAction::UpdateEntry {
                    entry_id,
                    data,
                    options,
                } => {
                    self.entry_store
                        .update_entry(&entry_id, data, options)
                        .await?;
                    info!(entry_id = %entry_id, "config entry updated from import");
                }
                SetupAction::Diagnostic(diagnostic) => report_diagnostic(diagnostic),
            }
        }

        Ok(follow_up_events)
    }
}

fn report_diagnostic(diagnostic: SetupDiagnostic) {
    match diagnostic {
        SetupDiagnostic::ImportFailed { reasons } => {
            error!(reasons = ?reasons, "static configuration import failed");
        }
        SetupDiagnostic::ImportMissingAccessToken { host } => {
            warn!(
                host = %host,
                "static configuration for a tv has no access token; complete pairing to obtain one"
            );
        }
    }
}
