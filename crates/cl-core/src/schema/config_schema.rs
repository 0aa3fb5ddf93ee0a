use serde::{Deserialize, Serialize};

use crate::device::{host_is_same, DeviceClass};
use crate::entry::{ConfigEntry, EntryData};

use super::{ConfigInput, FormErrorCode, FormErrors, FormField};

/// Validated connection details for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    pub host: String,
    pub device_class: DeviceClass,
    pub access_token: Option<String>,
    pub volume_step: Option<u8>,
}

impl DeviceConfig {
    /// Convert back into a form payload so a form can be re-populated.
    pub fn to_input(&self) -> ConfigInput {
        ConfigInput {
            name: Some(self.name.clone()),
            host: Some(self.host.clone()),
            device_class: Some(self.device_class.as_str().to_string()),
            access_token: self.access_token.clone(),
            volume_step: self.volume_step,
        }
    }

    pub fn to_entry_data(&self) -> EntryData {
        EntryData {
            name: self.name.clone(),
            host: self.host.clone(),
            device_class: self.device_class,
            access_token: self.access_token.clone(),
            volume_step: self.volume_step,
        }
    }
}

/// Values pre-filled on the configuration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFormDefaults {
    pub name: String,
    pub host: Option<String>,
    pub device_class: String,
    pub access_token: String,
}

/// Configuration form schema: required name, host and device class,
/// optional access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSchema {
    default_name: String,
    default_device_class: DeviceClass,
}

impl ConfigSchema {
    pub fn new(default_name: impl Into<String>, default_device_class: DeviceClass) -> Self {
        Self {
            default_name: default_name.into(),
            default_device_class,
        }
    }

    /// Form defaults, retaining whatever the user already provided.
    pub fn defaults_for(&self, input: Option<&ConfigInput>) -> ConfigFormDefaults {
        let input = input.cloned().unwrap_or_default();
        ConfigFormDefaults {
            name: input.name.unwrap_or_else(|| self.default_name.clone()),
            host: input.host,
            device_class: input
                .device_class
                .unwrap_or_else(|| self.default_device_class.as_str().to_string()),
            access_token: input.access_token.unwrap_or_default(),
        }
    }

    pub fn validate(&self, input: &ConfigInput) -> Result<DeviceConfig, FormErrors> {
        let mut errors = FormErrors::default();

        let name = self.effective_name(input);
        if name.trim().is_empty() {
            errors.insert(FormField::Name, FormErrorCode::Required);
        }

        let host = input.host.clone().unwrap_or_default();
        if host.trim().is_empty() {
            errors.insert(FormField::Host, FormErrorCode::Required);
        }

        let device_class = match input.device_class.as_deref() {
            None => self.default_device_class,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                errors.insert(FormField::DeviceClass, FormErrorCode::InvalidDeviceClass);
                self.default_device_class
            }),
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(DeviceConfig {
            name,
            host: host.trim().to_string(),
            device_class,
            access_token: input.access_token.clone().filter(|token| !token.is_empty()),
            volume_step: input.volume_step,
        })
    }

    /// Check the submitted name and host against existing entries.
    ///
    /// Both conflicts are reported when both apply.
    pub fn conflicts(&self, input: &ConfigInput, entries: &[ConfigEntry]) -> FormErrors {
        let mut errors = FormErrors::default();
        let name = self.effective_name(input);

        for entry in entries {
            if let Some(host) = input.host.as_deref() {
                if host_is_same(&entry.data.host, host.trim()) {
                    errors.insert(FormField::Host, FormErrorCode::HostExists);
                }
            }
            if entry.data.name == name {
                errors.insert(FormField::Name, FormErrorCode::NameExists);
            }
        }

        errors
    }

    fn effective_name(&self, input: &ConfigInput) -> String {
        input
            .name
            .clone()
            .unwrap_or_else(|| self.default_name.clone())
    }
}

impl Default for ConfigSchema {
    fn default() -> Self {
        Self::new(super::DEFAULT_NAME, DeviceClass::default())
    }
}
