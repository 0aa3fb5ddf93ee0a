use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Form field an error is attached to. `Base` is the form as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Base,
    Host,
    Name,
    DeviceClass,
    AccessToken,
    Pin,
}

/// Error codes surfaced inline on a redisplayed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormErrorCode {
    Required,
    InvalidDeviceClass,
    HostExists,
    NameExists,
    CantConnect,
    CompletePairingFailed,
}

impl FormErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormErrorCode::Required => "required",
            FormErrorCode::InvalidDeviceClass => "invalid_device_class",
            FormErrorCode::HostExists => "host_exists",
            FormErrorCode::NameExists => "name_exists",
            FormErrorCode::CantConnect => "cant_connect",
            FormErrorCode::CompletePairingFailed => "complete_pairing_failed",
        }
    }
}

/// Errors attached to a form, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormErrors(BTreeMap<FormField, FormErrorCode>);

impl FormErrors {
    pub fn single(field: FormField, code: FormErrorCode) -> Self {
        let mut errors = Self::default();
        errors.insert(field, code);
        errors
    }

    pub fn insert(&mut self, field: FormField, code: FormErrorCode) {
        self.0.insert(field, code);
    }

    /// Merge `other` into `self`; existing field errors win.
    pub fn merge(&mut self, other: FormErrors) {
        for (field, code) in other.0 {
            self.0.entry(field).or_insert(code);
        }
    }

    pub fn get(&self, field: FormField) -> Option<FormErrorCode> {
        self.0.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Error codes in field order, used for diagnostics.
    pub fn reasons(&self) -> Vec<&'static str> {
        self.0.values().map(FormErrorCode::as_str).collect()
    }
}
