//! # Dependency Injection / 依赖注入模块
//!
//! ## Responsibilities / 职责
//!
//! - ✅ Load settings through cl-infra / 通过 cl-infra 加载设置
//! - ✅ Inject the device client and entry store into the use cases / 将端口注入用例
//!
//! ## Prohibited / 禁止事项
//!
//! ❌ **No business logic / 禁止包含任何业务逻辑**
//! - Flow decisions belong to the setup state machine
//! - 流程决策属于设置状态机

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use cl_app::{ImportOutcome, ImportStaticConfig, OptionsFlow, SetupFlow};
use cl_core::ports::{DeviceClientPort, EntryStorePort};
use cl_core::settings::Settings;
use cl_core::ConfigEntry;
use cl_infra::{load_settings, load_static_config, InMemoryEntryStore};

/// Assembled castlink instance: settings plus the two ports every flow uses.
pub struct Castlink {
    settings: Settings,
    device_client: Arc<dyn DeviceClientPort>,
    entry_store: Arc<dyn EntryStorePort>,
}

impl Castlink {
    pub fn new(
        settings: Settings,
        device_client: Arc<dyn DeviceClientPort>,
        entry_store: Arc<dyn EntryStorePort>,
    ) -> Self {
        Self {
            settings,
            device_client,
            entry_store,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn entry_store(&self) -> Arc<dyn EntryStorePort> {
        Arc::clone(&self.entry_store)
    }

    /// A fresh setup flow with its own flow id.
    pub fn setup_flow(&self) -> SetupFlow {
        SetupFlow::new(
            Arc::clone(&self.device_client),
            Arc::clone(&self.entry_store),
            self.settings.setup.clone(),
        )
    }

    pub fn options_flow(&self, entry: ConfigEntry) -> OptionsFlow {
        OptionsFlow::new(Arc::clone(&self.entry_store), entry)
    }

    pub fn import_static_config(&self) -> ImportStaticConfig {
        ImportStaticConfig::new(
            Arc::clone(&self.device_client),
            Arc::clone(&self.entry_store),
            self.settings.setup.clone(),
        )
    }

    /// Import every device declared in the static configuration file at `path`.
    pub async fn import_from_file(
        &self,
        path: impl AsRef<Path>,
    ) -> anyhow::Result<Vec<ImportOutcome>> {
        let path = path.as_ref();
        let devices = load_static_config(path)
            .await
            .with_context(|| format!("load static devices failed: {}", path.display()))?;
        info!(devices = devices.len(), path = %path.display(), "importing static devices");
        Ok(self.import_static_config().execute(devices).await)
    }
}

/// Wire castlink from an optional settings file.
///
/// The entry store defaults to [`InMemoryEntryStore`] when the host does not
/// provide one.
pub fn wire(
    settings_path: Option<&Path>,
    device_client: Arc<dyn DeviceClientPort>,
    entry_store: Option<Arc<dyn EntryStorePort>>,
) -> anyhow::Result<Castlink> {
    let settings = load_settings(settings_path)?;
    let entry_store =
        entry_store.unwrap_or_else(|| Arc::new(InMemoryEntryStore::new()) as Arc<dyn EntryStorePort>);
    Ok(Castlink::new(settings, device_client, entry_store))
}
