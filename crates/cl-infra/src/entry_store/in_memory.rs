//! In-memory configuration entry store.
//!
//! 内存中的配置项存储，用于测试和嵌入场景。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use cl_core::device::host_is_same;
use cl_core::ports::{EntryStoreError, EntryStorePort, UniqueIdClaim};
use cl_core::{ConfigEntry, EntryData, EntryId, EntryOptions, FlowId, NewConfigEntry};

#[derive(Debug, Default)]
struct StoreState {
    entries: Vec<ConfigEntry>,
    /// Identity reserved by each in-progress flow.
    claims: HashMap<FlowId, String>,
}

/// [`EntryStorePort`] backed by process memory.
///
/// Entries and claims share one lock, so a claim check and its insert happen
/// atomically. Host (ignoring port), name and unique id are kept unique per
/// domain; violations are reported as [`EntryStoreError::Conflict`].
#[derive(Debug, Default)]
pub struct InMemoryEntryStore {
    state: Mutex<StoreState>,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with existing entries.
    pub fn with_entries(entries: Vec<ConfigEntry>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                entries,
                claims: HashMap::new(),
            }),
        }
    }

    /// Identity currently claimed by `flow_id`, if any.
    pub async fn claim_of(&self, flow_id: &FlowId) -> Option<String> {
        self.state.lock().await.claims.get(flow_id).cloned()
    }
}

fn find_conflict(
    entries: &[ConfigEntry],
    domain: &str,
    data: &EntryData,
    unique_id: Option<&str>,
    skip: Option<&EntryId>,
) -> Option<String> {
    entries
        .iter()
        .filter(|entry| entry.domain == domain && Some(&entry.entry_id) != skip)
        .find_map(|entry| {
            if host_is_same(&entry.data.host, &data.host) {
                Some(format!("host {} already configured", data.host))
            } else if entry.data.name == data.name {
                Some(format!("name {} already configured", data.name))
            } else {
                unique_id
                    .filter(|id| entry.unique_id.as_deref() == Some(*id))
                    .map(|id| format!("unique id {id} already configured"))
            }
        })
}

#[async_trait]
impl EntryStorePort for InMemoryEntryStore {
    async fn list_entries(&self, domain: &str) -> Result<Vec<ConfigEntry>, EntryStoreError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .filter(|entry| entry.domain == domain)
            .cloned()
            .collect())
    }

    async fn create_entry(&self, entry: NewConfigEntry) -> Result<ConfigEntry, EntryStoreError> {
        let mut state = self.state.lock().await;

        if let Some(reason) = find_conflict(
            &state.entries,
            &entry.domain,
            &entry.data,
            entry.unique_id.as_deref(),
            None,
        ) {
            return Err(EntryStoreError::Conflict(reason));
        }

        let created = ConfigEntry {
            entry_id: EntryId::new(),
            domain: entry.domain,
            title: entry.title,
            unique_id: entry.unique_id,
            data: entry.data,
            options: entry.options,
            created_at: Utc::now(),
        };
        debug!(entry_id = %created.entry_id, "entry stored");
        state.entries.push(created.clone());
        Ok(created)
    }

    async fn update_entry(
        &self,
        entry_id: &EntryId,
        data: EntryData,
        options: EntryOptions,
    ) -> Result<(), EntryStoreError> {
        let mut state = self.state.lock().await;

        let Some(index) = state
            .entries
            .iter()
            .position(|entry| &entry.entry_id == entry_id)
        else {
            return Err(EntryStoreError::NotFound(entry_id.clone()));
        };

        let domain = state.entries[index].domain.clone();
        if let Some(reason) = find_conflict(&state.entries, &domain, &data, None, Some(entry_id)) {
            return Err(EntryStoreError::Conflict(reason));
        }

        let entry = &mut state.entries[index];
        entry.data = data;
        entry.options = options;
        Ok(())
    }

    async fn claim_unique_id(
        &self,
        flow_id: &FlowId,
        unique_id: &str,
    ) -> Result<UniqueIdClaim, EntryStoreError> {
        let mut state = self.state.lock().await;

        let held_elsewhere = state
            .claims
            .iter()
            .any(|(owner, claimed)| owner != flow_id && claimed == unique_id);
        if held_elsewhere {
            return Ok(UniqueIdClaim::AlreadyInProgress);
        }

        state.claims.insert(flow_id.clone(), unique_id.to_string());
        Ok(UniqueIdClaim::Claimed)
    }

    async fn release_unique_id(&self, flow_id: &FlowId) -> Result<(), EntryStoreError> {
        self.state.lock().await.claims.remove(flow_id);
        Ok(())
    }
}
