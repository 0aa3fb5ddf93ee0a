//! Configuration entry model.
//!
//! Entries are owned by the external entry store; this module only describes
//! their shape and the options sub-record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::DeviceClass;
use crate::ids::EntryId;

/// Integration domain under which entries are registered in the store.
pub const DOMAIN: &str = "smartcast";

pub const MIN_VOLUME_STEP: u8 = 1;
pub const MAX_VOLUME_STEP: u8 = 10;
pub const DEFAULT_VOLUME_STEP: u8 = 1;

/// Connection data of a configured device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    pub name: String,
    pub host: String,
    pub device_class: DeviceClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Only present for entries created or updated from static configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_step: Option<u8>,
}

/// Options sub-record, mutable after the entry has been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOptions {
    pub volume_step: u8,
}

impl EntryOptions {
    pub fn new(volume_step: u8) -> Self {
        Self {
            volume_step: clamp_volume_step(i64::from(volume_step)),
        }
    }
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            volume_step: DEFAULT_VOLUME_STEP,
        }
    }
}

/// Clamp any integer into the accepted volume step range.
pub fn clamp_volume_step(value: i64) -> u8 {
    value.clamp(i64::from(MIN_VOLUME_STEP), i64::from(MAX_VOLUME_STEP)) as u8
}

/// A persisted configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: EntryId,
    pub domain: String,
    pub title: String,
    pub unique_id: Option<String>,
    pub data: EntryData,
    pub options: EntryOptions,
    pub created_at: DateTime<Utc>,
}

/// Entry as handed to the store for creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConfigEntry {
    pub domain: String,
    pub title: String,
    pub unique_id: Option<String>,
    pub data: EntryData,
    pub options: EntryOptions,
}
