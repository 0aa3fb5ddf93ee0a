//! Use case for importing devices declared in static configuration
//! 从静态配置导入设备的用例

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, info_span, warn, Instrument};

use cl_core::ports::{DeviceClientPort, EntryStorePort};
use cl_core::settings::SetupSettings;
use cl_core::setup::SetupState;
use cl_core::ImportConfig;

use super::setup::{SetupFlow, SetupFlowError};

/// Outcome of importing one declared device.
///
/// Flows that stopped on a form (for example a TV that still has to be
/// paired) are handed back so the caller can continue them.
pub struct ImportOutcome {
    pub host: String,
    pub flow: SetupFlow,
    pub result: Result<SetupState, SetupFlowError>,
}

impl ImportOutcome {
    /// Whether the flow is still waiting for user input.
    pub fn needs_attention(&self) -> bool {
        matches!(&self.result, Ok(SetupState::ShowForm(_)))
    }
}

/// Start one import flow per declared device.
///
/// ## Behavior / 行为
/// - Every device gets its own [`SetupFlow`]; flows run concurrently
/// - Outcomes are returned in declaration order
pub struct ImportStaticConfig {
    device_client: Arc<dyn DeviceClientPort>,
    entry_store: Arc<dyn EntryStorePort>,
    settings: SetupSettings,
}

impl ImportStaticConfig {
    pub fn new(
        device_client: Arc<dyn DeviceClientPort>,
        entry_store: Arc<dyn EntryStorePort>,
        settings: SetupSettings,
    ) -> Self {
        Self {
            device_client,
            entry_store,
            settings,
        }
    }

    pub async fn execute(&self, devices: Vec<ImportConfig>) -> Vec<ImportOutcome> {
        let span = info_span!("usecase.import_static_config.execute", devices = devices.len());

        async {
            let imports = devices.into_iter().map(|config| async move {
                let flow = SetupFlow::new(
                    Arc::clone(&self.device_client),
                    Arc::clone(&self.entry_store),
                    self.settings.clone(),
                );
                let host = config.host.clone();
                let result = flow.start_from_import(config).await;
                match &result {
                    Ok(state) => info!(host = %host, outcome = state.label(), "device import finished"),
                    Err(err) => warn!(host = %host, error = %err, "device import failed"),
                }
                ImportOutcome { host, flow, result }
            });

            join_all(imports).await
        }
        .instrument(span)
        .await
    }
}
