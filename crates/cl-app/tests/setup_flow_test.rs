use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use tokio::sync::Notify;

use cl_app::{SetupFlow, SetupFlowError};
use cl_core::ports::{
    DeviceClientPort, DeviceProbe, EntryStoreError, EntryStorePort, PairingHandshake,
    PairingTarget, UniqueIdClaim,
};
use cl_core::schema::{FormErrorCode, FormField};
use cl_core::setup::FormSchema;
use cl_core::{
    AbortReason, ConfigInput, DeviceClass, DiscoveryInfo, EntryData, EntryOptions, ImportConfig,
    NewConfigEntry, SetupSettings, SetupState, StepId, DOMAIN,
};
use cl_infra::InMemoryEntryStore;

mock! {
    pub DeviceClient {}

    #[async_trait]
    impl DeviceClientPort for DeviceClient {
        async fn guess_device_class(&self, host: &str) -> anyhow::Result<DeviceClass>;
        async fn validate(&self, probe: &DeviceProbe) -> anyhow::Result<bool>;
        async fn compute_unique_id(&self, probe: &DeviceProbe) -> anyhow::Result<Option<String>>;
        async fn start_pairing(&self, target: &PairingTarget)
            -> anyhow::Result<Option<PairingHandshake>>;
        async fn complete_pairing(
            &self,
            target: &PairingTarget,
            handshake: &PairingHandshake,
            pin: &str,
        ) -> anyhow::Result<Option<String>>;
    }
}

const HANDSHAKE: PairingHandshake = PairingHandshake {
    channel_type: 1,
    token: 424242,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn build_flow(client: MockDeviceClient, store: &Arc<InMemoryEntryStore>) -> SetupFlow {
    SetupFlow::new(Arc::new(client), store.clone(), SetupSettings::default())
}

async fn seed_entry(store: &InMemoryEntryStore, name: &str, host: &str, volume_step: Option<u8>) {
    store
        .create_entry(NewConfigEntry {
            domain: DOMAIN.to_string(),
            title: name.to_string(),
            unique_id: Some(format!("uid-{name}")),
            data: EntryData {
                name: name.to_string(),
                host: host.to_string(),
                device_class: DeviceClass::Tv,
                access_token: Some("token".to_string()),
                volume_step,
            },
            options: EntryOptions::new(volume_step.unwrap_or(1)),
        })
        .await
        .expect("seed entry");
}

fn assert_unique(entries: &[cl_core::ConfigEntry]) {
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            assert!(
                !cl_core::device::host_is_same(&a.data.host, &b.data.host),
                "duplicate host {}",
                a.data.host
            );
            assert_ne!(a.data.name, b.data.name);
        }
    }
}

#[tokio::test]
async fn speaker_happy_path_creates_entry_without_pairing() {
    init_tracing();
    let store = Arc::new(InMemoryEntryStore::new());
    let mut client = MockDeviceClient::new();
    client
        .expect_validate()
        .withf(|probe| probe.host == "1.2.3.4" && probe.device_class == DeviceClass::Speaker)
        .times(1)
        .returning(|_| Ok(true));
    client
        .expect_compute_unique_id()
        .times(1)
        .returning(|_| Ok(Some("speaker-serial".to_string())));
    let flow = build_flow(client, &store);

    let state = flow
        .start_from_user(Some(ConfigInput::new(
            "Living Room",
            "1.2.3.4",
            DeviceClass::Speaker,
        )))
        .await
        .expect("start from user");

    assert_eq!(
        state,
        SetupState::Created {
            title: "Living Room".to_string(),
            unique_id: "speaker-serial".to_string(),
        }
    );
    let entries = store.list_entries(DOMAIN).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Living Room");
    assert_eq!(entries[0].options.volume_step, 1);
    assert_eq!(store.claim_of(flow.flow_id()).await, None);
}

#[tokio::test]
async fn speaker_with_access_token_is_validated_without_pairing() {
    let store = Arc::new(InMemoryEntryStore::new());
    let mut client = MockDeviceClient::new();
    client
        .expect_validate()
        .withf(|probe| {
            probe.device_class == DeviceClass::Speaker
                && probe.access_token.as_deref() == Some("speaker-token")
        })
        .times(1)
        .returning(|_| Ok(true));
    client
        .expect_compute_unique_id()
        .withf(|probe| probe.access_token.as_deref() == Some("speaker-token"))
        .times(1)
        .returning(|_| Ok(Some("speaker-serial".to_string())));
    client.expect_start_pairing().never();
    let flow = build_flow(client, &store);

    let state = flow
        .start_from_user(Some(
            ConfigInput::new("Patio", "1.2.3.4", DeviceClass::Speaker)
                .with_access_token("speaker-token"),
        ))
        .await
        .unwrap();

    assert!(matches!(state, SetupState::Created { ref title, .. } if title == "Patio"));
    let entries = store.list_entries(DOMAIN).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data.device_class, DeviceClass::Speaker);
    assert_eq!(entries[0].data.access_token.as_deref(), Some("speaker-token"));
    assert_eq!(store.claim_of(flow.flow_id()).await, None);
}

#[tokio::test]
async fn same_host_on_other_port_is_rejected() {
    let store = Arc::new(InMemoryEntryStore::new());
    seed_entry(&store, "Bedroom", "1.2.3.4:100", None).await;
    let flow = build_flow(MockDeviceClient::new(), &store);

    let state = flow
        .start_from_user(Some(ConfigInput::new(
            "Office",
            "1.2.3.4:200",
            DeviceClass::Tv,
        )))
        .await
        .unwrap();

    let form = state.form().expect("user form");
    assert_eq!(form.step_id, StepId::User);
    assert_eq!(form.errors.get(FormField::Host), Some(FormErrorCode::HostExists));
}

#[tokio::test]
async fn refused_pairing_returns_to_user_form() {
    let store = Arc::new(InMemoryEntryStore::new());
    let mut client = MockDeviceClient::new();
    client
        .expect_start_pairing()
        .withf(|target| target.client_id == "castlink" && target.name == "Den")
        .times(1)
        .returning(|_| Ok(None));
    let flow = build_flow(client, &store);

    let state = flow
        .start_from_user(Some(ConfigInput::new("Den", "1.2.3.4", DeviceClass::Tv)))
        .await
        .unwrap();

    let form = state.form().expect("user form");
    assert_eq!(form.step_id, StepId::User);
    assert_eq!(form.errors.get(FormField::Base), Some(FormErrorCode::CantConnect));
}

#[tokio::test]
async fn device_errors_are_shown_as_cant_connect() {
    let store = Arc::new(InMemoryEntryStore::new());
    let mut client = MockDeviceClient::new();
    client
        .expect_validate()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("connection timed out")));
    let flow = build_flow(client, &store);

    let state = flow
        .start_from_user(Some(
            ConfigInput::new("Den", "1.2.3.4", DeviceClass::Tv).with_access_token("abc"),
        ))
        .await
        .unwrap();

    assert_eq!(
        state.form().and_then(|form| form.errors.get(FormField::Base)),
        Some(FormErrorCode::CantConnect)
    );
    assert!(store.list_entries(DOMAIN).await.unwrap().is_empty());
}

#[tokio::test]
async fn tv_pairing_creates_entry_with_token_after_one_confirmation() {
    init_tracing();
    let store = Arc::new(InMemoryEntryStore::new());
    let mut client = MockDeviceClient::new();
    client
        .expect_start_pairing()
        .times(1)
        .returning(|_| Ok(Some(HANDSHAKE)));
    client
        .expect_complete_pairing()
        .withf(|_, handshake, pin| *handshake == HANDSHAKE && pin == "1234")
        .times(1)
        .returning(|_, _, _| Ok(Some("fresh-token".to_string())));
    client
        .expect_compute_unique_id()
        .withf(|probe| probe.access_token.as_deref() == Some("fresh-token"))
        .times(1)
        .returning(|_| Ok(Some("tv-serial".to_string())));
    let flow = build_flow(client, &store);

    let state = flow
        .start_from_user(Some(ConfigInput::new(
            "Living Room",
            "1.2.3.4",
            DeviceClass::Tv,
        )))
        .await
        .unwrap();
    assert_eq!(state.step_id(), Some(StepId::PairTv));

    let mut confirmations = 0;
    let mut state = flow.submit_pin(Some("1234".to_string())).await.unwrap();
    while let Some(form) = state.form() {
        assert_eq!(form.step_id, StepId::PairingComplete);
        assert_eq!(form.schema, FormSchema::Confirmation);
        confirmations += 1;
        state = flow.confirm_pairing().await.unwrap();
    }

    assert_eq!(confirmations, 1);
    assert!(matches!(state, SetupState::Created { .. }));
    let entries = store.list_entries(DOMAIN).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data.access_token.as_deref(), Some("fresh-token"));
}

#[tokio::test]
async fn rejected_pin_can_be_retried_without_restarting_pairing() {
    let store = Arc::new(InMemoryEntryStore::new());
    let mut client = MockDeviceClient::new();
    client
        .expect_start_pairing()
        .times(1)
        .returning(|_| Ok(Some(HANDSHAKE)));
    client
        .expect_complete_pairing()
        .withf(|_, _, pin| pin == "0000")
        .times(1)
        .returning(|_, _, _| Ok(None));
    client
        .expect_complete_pairing()
        .withf(|_, _, pin| pin == "1234")
        .times(1)
        .returning(|_, _, _| Ok(Some("token".to_string())));
    let flow = build_flow(client, &store);

    flow.start_from_user(Some(ConfigInput::new("Den", "1.2.3.4", DeviceClass::Tv)))
        .await
        .unwrap();

    let state = flow.submit_pin(Some("0000".to_string())).await.unwrap();
    assert_eq!(
        state.form().and_then(|form| form.errors.get(FormField::Pin)),
        Some(FormErrorCode::CompletePairingFailed)
    );

    let state = flow.submit_pin(Some("1234".to_string())).await.unwrap();
    assert_eq!(state.step_id(), Some(StepId::PairingComplete));
}

#[tokio::test]
async fn import_with_new_volume_step_updates_existing_entry() {
    let store = Arc::new(InMemoryEntryStore::new());
    seed_entry(&store, "Living Room", "1.2.3.4:7345", Some(1)).await;
    let flow = build_flow(MockDeviceClient::new(), &store);

    let state = flow
        .start_from_import(ImportConfig {
            name: "Living Room".to_string(),
            host: "1.2.3.4".to_string(),
            device_class: DeviceClass::Tv,
            access_token: Some("token".to_string()),
            volume_step: 5,
        })
        .await
        .unwrap();

    assert_eq!(
        state,
        SetupState::Aborted {
            reason: AbortReason::UpdatedEntry
        }
    );
    let entries = store.list_entries(DOMAIN).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data.volume_step, Some(5));
    assert_eq!(entries[0].options.volume_step, 5);
}

fn discovery() -> DiscoveryInfo {
    DiscoveryInfo {
        host: "1.2.3.4".to_string(),
        port: 9000,
        name: "Living Room._viziocast._tcp.local.".to_string(),
        service_type: "_viziocast._tcp.local.".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_discovery_of_same_device_runs_once() {
    let store = Arc::new(InMemoryEntryStore::new());
    let mut client = MockDeviceClient::new();
    client
        .expect_guess_device_class()
        .times(1)
        .returning(|_| Ok(DeviceClass::Speaker));
    let client: Arc<dyn DeviceClientPort> = Arc::new(client);

    let first = SetupFlow::new(client.clone(), store.clone(), SetupSettings::default());
    let second = SetupFlow::new(client, store.clone(), SetupSettings::default());

    let (a, b) = tokio::join!(
        first.start_from_discovery(discovery()),
        second.start_from_discovery(discovery())
    );
    let states = [a.unwrap(), b.unwrap()];

    let proceeding = states
        .iter()
        .filter(|state| state.step_id() == Some(StepId::User))
        .count();
    let aborted = states
        .iter()
        .filter(|state| {
            **state
                == SetupState::Aborted {
                    reason: AbortReason::AlreadySetup,
                }
        })
        .count();
    assert_eq!((proceeding, aborted), (1, 1));
}

#[tokio::test]
async fn discovery_failure_to_guess_defaults_to_tv() {
    let store = Arc::new(InMemoryEntryStore::new());
    let mut client = MockDeviceClient::new();
    client
        .expect_guess_device_class()
        .withf(|host| host == "1.2.3.4:9000")
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("no answer")));
    let flow = build_flow(client, &store);

    let state = flow.start_from_discovery(discovery()).await.unwrap();

    match state.form().map(|form| &form.schema) {
        Some(FormSchema::Config(defaults)) => {
            assert_eq!(defaults.device_class, "tv");
            assert_eq!(defaults.name, "Living Room");
        }
        other => panic!("unexpected form {other:?}"),
    }
}

#[tokio::test]
async fn closing_flow_releases_discovery_claim() {
    let store = Arc::new(InMemoryEntryStore::new());
    let mut client = MockDeviceClient::new();
    client
        .expect_guess_device_class()
        .returning(|_| Ok(DeviceClass::Tv));
    let client: Arc<dyn DeviceClientPort> = Arc::new(client);

    let first = SetupFlow::new(client.clone(), store.clone(), SetupSettings::default());
    first.start_from_discovery(discovery()).await.unwrap();
    assert_eq!(
        store.claim_of(first.flow_id()).await.as_deref(),
        Some("1.2.3.4")
    );

    first.close().await.unwrap();

    let second = SetupFlow::new(client, store.clone(), SetupSettings::default());
    let state = second.start_from_discovery(discovery()).await.unwrap();
    assert_eq!(state.step_id(), Some(StepId::User));
}

#[tokio::test]
async fn known_device_identity_is_not_configured_twice() {
    let store = Arc::new(InMemoryEntryStore::new());
    let mut client = MockDeviceClient::new();
    client.expect_validate().returning(|_| Ok(true));
    client
        .expect_compute_unique_id()
        .returning(|_| Ok(Some("same-serial".to_string())));
    let client: Arc<dyn DeviceClientPort> = Arc::new(client);

    let first = SetupFlow::new(client.clone(), store.clone(), SetupSettings::default());
    let created = first
        .start_from_user(Some(ConfigInput::new("Den", "1.2.3.4", DeviceClass::Speaker)))
        .await
        .unwrap();
    assert!(matches!(created, SetupState::Created { .. }));

    let second = SetupFlow::new(client, store.clone(), SetupSettings::default());
    let state = second
        .start_from_user(Some(ConfigInput::new(
            "Kitchen",
            "10.0.0.9",
            DeviceClass::Speaker,
        )))
        .await
        .unwrap();

    assert_eq!(
        state,
        SetupState::Aborted {
            reason: AbortReason::AlreadyConfigured
        }
    );
    let entries = store.list_entries(DOMAIN).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_unique(&entries);
}

struct FailingStore;

#[async_trait]
impl EntryStorePort for FailingStore {
    async fn list_entries(
        &self,
        _domain: &str,
    ) -> Result<Vec<cl_core::ConfigEntry>, EntryStoreError> {
        Err(EntryStoreError::Storage("unavailable".to_string()))
    }

    async fn create_entry(
        &self,
        _entry: NewConfigEntry,
    ) -> Result<cl_core::ConfigEntry, EntryStoreError> {
        Err(EntryStoreError::Storage("unavailable".to_string()))
    }

    async fn update_entry(
        &self,
        _entry_id: &cl_core::EntryId,
        _data: EntryData,
        _options: EntryOptions,
    ) -> Result<(), EntryStoreError> {
        Err(EntryStoreError::Storage("unavailable".to_string()))
    }

    async fn claim_unique_id(
        &self,
        _flow_id: &cl_core::FlowId,
        _unique_id: &str,
    ) -> Result<cl_core::ports::UniqueIdClaim, EntryStoreError> {
        Err(EntryStoreError::Storage("unavailable".to_string()))
    }

    async fn release_unique_id(&self, _flow_id: &cl_core::FlowId) -> Result<(), EntryStoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn store_failure_leaves_state_unchanged() {
    let flow = SetupFlow::new(
        Arc::new(MockDeviceClient::new()),
        Arc::new(FailingStore),
        SetupSettings::default(),
    );

    let result = flow.start_from_user(None).await;

    assert!(matches!(result, Err(SetupFlowError::Store(_))));
    assert_eq!(flow.state().await, SetupState::Idle);
}

/// Speaker client whose reachability check waits until `release` is notified.
struct HeldSpeaker {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl DeviceClientPort for HeldSpeaker {
    async fn guess_device_class(&self, _host: &str) -> anyhow::Result<DeviceClass> {
        Ok(DeviceClass::Speaker)
    }

    async fn validate(&self, _probe: &DeviceProbe) -> anyhow::Result<bool> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(true)
    }

    async fn compute_unique_id(&self, _probe: &DeviceProbe) -> anyhow::Result<Option<String>> {
        Ok(Some("same-serial".to_string()))
    }

    async fn start_pairing(
        &self,
        _target: &PairingTarget,
    ) -> anyhow::Result<Option<PairingHandshake>> {
        anyhow::bail!("speakers do not pair")
    }

    async fn complete_pairing(
        &self,
        _target: &PairingTarget,
        _handshake: &PairingHandshake,
        _pin: &str,
    ) -> anyhow::Result<Option<String>> {
        anyhow::bail!("speakers do not pair")
    }
}

#[tokio::test]
async fn device_configured_by_other_flow_during_checks_aborts() {
    init_tracing();
    let store = Arc::new(InMemoryEntryStore::new());
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let held = Arc::new(SetupFlow::new(
        Arc::new(HeldSpeaker {
            entered: entered.clone(),
            release: release.clone(),
        }),
        store.clone(),
        SetupSettings::default(),
    ));

    let pending = tokio::spawn({
        let held = held.clone();
        async move {
            held.start_from_user(Some(ConfigInput::new(
                "Kitchen",
                "1.2.3.5",
                DeviceClass::Speaker,
            )))
            .await
        }
    });
    entered.notified().await;

    let mut client = MockDeviceClient::new();
    client.expect_validate().returning(|_| Ok(true));
    client
        .expect_compute_unique_id()
        .returning(|_| Ok(Some("same-serial".to_string())));
    let first = build_flow(client, &store);
    let created = first
        .start_from_user(Some(ConfigInput::new("Den", "1.2.3.4", DeviceClass::Speaker)))
        .await
        .unwrap();
    assert!(matches!(created, SetupState::Created { .. }));

    release.notify_one();
    let state = pending.await.unwrap().unwrap();

    assert_eq!(
        state,
        SetupState::Aborted {
            reason: AbortReason::AlreadyConfigured
        }
    );
    let entries = store.list_entries(DOMAIN).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Den");
    assert_eq!(store.claim_of(held.flow_id()).await, None);
}

/// In-memory store that refuses every new entry as a duplicate.
struct RefusingStore {
    inner: InMemoryEntryStore,
}

#[async_trait]
impl EntryStorePort for RefusingStore {
    async fn list_entries(
        &self,
        domain: &str,
    ) -> Result<Vec<cl_core::ConfigEntry>, EntryStoreError> {
        self.inner.list_entries(domain).await
    }

    async fn create_entry(
        &self,
        entry: NewConfigEntry,
    ) -> Result<cl_core::ConfigEntry, EntryStoreError> {
        Err(EntryStoreError::Conflict(format!(
            "unique id {} already configured",
            entry.unique_id.unwrap_or_default()
        )))
    }

    async fn update_entry(
        &self,
        entry_id: &cl_core::EntryId,
        data: EntryData,
        options: EntryOptions,
    ) -> Result<(), EntryStoreError> {
        self.inner.update_entry(entry_id, data, options).await
    }

    async fn claim_unique_id(
        &self,
        flow_id: &cl_core::FlowId,
        unique_id: &str,
    ) -> Result<UniqueIdClaim, EntryStoreError> {
        self.inner.claim_unique_id(flow_id, unique_id).await
    }

    async fn release_unique_id(&self, flow_id: &cl_core::FlowId) -> Result<(), EntryStoreError> {
        self.inner.release_unique_id(flow_id).await
    }
}

#[tokio::test]
async fn duplicate_refused_by_store_aborts_and_releases_claim() {
    let store = Arc::new(RefusingStore {
        inner: InMemoryEntryStore::new(),
    });
    let mut client = MockDeviceClient::new();
    client.expect_validate().times(1).returning(|_| Ok(true));
    client
        .expect_compute_unique_id()
        .times(1)
        .returning(|_| Ok(Some("speaker-serial".to_string())));
    let flow = SetupFlow::new(Arc::new(client), store.clone(), SetupSettings::default());

    let state = flow
        .start_from_user(Some(ConfigInput::new("Den", "1.2.3.4", DeviceClass::Speaker)))
        .await
        .unwrap();

    assert_eq!(
        state,
        SetupState::Aborted {
            reason: AbortReason::AlreadyConfigured
        }
    );
    assert_eq!(flow.state().await, state);
    assert_eq!(store.inner.claim_of(flow.flow_id()).await, None);
}
