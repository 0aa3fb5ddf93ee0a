use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entry::{ConfigEntry, EntryData, EntryOptions, NewConfigEntry};
use crate::ids::{EntryId, FlowId};

use super::errors::EntryStoreError;

/// Result of reserving a device identity for a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniqueIdClaim {
    Claimed,
    /// Another in-progress flow already holds the identifier.
    AlreadyInProgress,
}

/// Host-owned registry of configuration entries.
#[async_trait]
pub trait EntryStorePort: Send + Sync {
    async fn list_entries(&self, domain: &str) -> Result<Vec<ConfigEntry>, EntryStoreError>;

    async fn create_entry(&self, entry: NewConfigEntry) -> Result<ConfigEntry, EntryStoreError>;

    /// Replace both the data and the options record of an entry.
    async fn update_entry(
        &self,
        entry_id: &EntryId,
        data: EntryData,
        options: EntryOptions,
    ) -> Result<(), EntryStoreError>;

    /// Atomically reserve `unique_id` for `flow_id`.
    ///
    /// A flow holds at most one claim: claiming again replaces its previous
    /// one. Must be atomic across concurrent flows.
    async fn claim_unique_id(
        &self,
        flow_id: &FlowId,
        unique_id: &str,
    ) -> Result<UniqueIdClaim, EntryStoreError>;

    /// Drop whatever claim `flow_id` holds. Idempotent.
    async fn release_unique_id(&self, flow_id: &FlowId) -> Result<(), EntryStoreError>;
}
