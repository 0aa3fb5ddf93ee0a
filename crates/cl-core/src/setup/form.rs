use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{ConfigFormDefaults, FormErrors};

/// Step identifiers of the setup flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    User,
    Import,
    Discovery,
    PairTv,
    PairingComplete,
    PairingCompleteImport,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::User => "user",
            StepId::Import => "import",
            StepId::Discovery => "discovery",
            StepId::PairTv => "pair_tv",
            StepId::PairingComplete => "pairing_complete",
            StepId::PairingCompleteImport => "pairing_complete_import",
        }
    }
}

/// Fields shown on a form, with their pre-filled values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormSchema {
    /// Name, host, device class and optional access token.
    Config(ConfigFormDefaults),
    /// PIN displayed on the device.
    Pairing { pin: String },
    /// Informational only, no input fields.
    Confirmation,
}

/// A form the caller has to render and submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupForm {
    pub step_id: StepId,
    pub schema: FormSchema,
    pub errors: FormErrors,
    pub placeholders: BTreeMap<String, String>,
}

impl SetupForm {
    pub fn user(defaults: ConfigFormDefaults, errors: FormErrors) -> Self {
        Self {
            step_id: StepId::User,
            schema: FormSchema::Config(defaults),
            errors,
            placeholders: BTreeMap::new(),
        }
    }

    pub fn pair_tv(pin: impl Into<String>, errors: FormErrors) -> Self {
        Self {
            step_id: StepId::PairTv,
            schema: FormSchema::Pairing { pin: pin.into() },
            errors,
            placeholders: BTreeMap::new(),
        }
    }

    /// Confirmation shown once pairing succeeded, carrying the new token so
    /// the user can copy it into static configuration.
    pub fn pairing_complete(step_id: StepId, access_token: &str) -> Self {
        let mut placeholders = BTreeMap::new();
        placeholders.insert("access_token".to_string(), access_token.to_string());
        Self {
            step_id,
            schema: FormSchema::Confirmation,
            errors: FormErrors::default(),
            placeholders,
        }
    }
}
