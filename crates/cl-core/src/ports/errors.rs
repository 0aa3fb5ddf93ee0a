use thiserror::Error;

use crate::ids::EntryId;

#[derive(Debug, Error)]
pub enum EntryStoreError {
    #[error("entry not found: {0}")]
    NotFound(EntryId),

    #[error("entry conflicts with an existing entry: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}
