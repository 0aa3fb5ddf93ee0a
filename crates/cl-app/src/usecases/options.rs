//! Options sub-flow for an existing entry.
//! 已有配置项的选项流程

use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use cl_core::options::{OptionsForm, OptionsInput};
use cl_core::ports::{EntryStoreError, EntryStorePort};
use cl_core::{ConfigEntry, EntryOptions};

/// Result of one options step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsStep {
    ShowForm(OptionsForm),
    /// Options were replaced in the store.
    Updated(EntryOptions),
}

/// Edit the `volume_step` option of an entry.
///
/// ## Behavior / 行为
/// - `init(None)` shows the form pre-filled with the current value
/// - `init(Some(input))` clamps the value into range and replaces the
///   entry's options record wholesale
///
/// The device is never contacted.
pub struct OptionsFlow {
    entry_store: Arc<dyn EntryStorePort>,
    entry: ConfigEntry,
}

impl OptionsFlow {
    pub fn new(entry_store: Arc<dyn EntryStorePort>, entry: ConfigEntry) -> Self {
        Self { entry_store, entry }
    }

    pub async fn init(&self, input: Option<OptionsInput>) -> Result<OptionsStep, EntryStoreError> {
        let span = info_span!("usecase.options_flow.init", entry_id = %self.entry.entry_id);
        async {
            // The entry may have changed since the flow was opened, e.g. by an import.
            let current = self.current_entry().await?;
            let Some(input) = input else {
                return Ok(OptionsStep::ShowForm(OptionsForm::for_entry(&current)));
            };

            let options = input.into_options();
            self.entry_store
                .update_entry(&current.entry_id, current.data, options)
                .await?;
            info!(volume_step = options.volume_step, "entry options updated");
            Ok(OptionsStep::Updated(options))
        }
        .instrument(span)
        .await
    }

    async fn current_entry(&self) -> Result<ConfigEntry, EntryStoreError> {
        self.entry_store
            .list_entries(&self.entry.domain)
            .await?
            .into_iter()
            .find(|entry| entry.entry_id == self.entry.entry_id)
            .ok_or_else(|| EntryStoreError::NotFound(self.entry.entry_id.clone()))
    }
}
