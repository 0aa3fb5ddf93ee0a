use serde::{Deserialize, Serialize};

use crate::device::DeviceClass;
use crate::entry::DEFAULT_VOLUME_STEP;

use super::DEFAULT_NAME;

/// Raw configuration form submission.
///
/// Every field is optional because the payload may come from a partially
/// filled form, a discovery record or a static import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub device_class: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Carried through from static configuration; never shown on the form.
    #[serde(default)]
    pub volume_step: Option<u8>,
}

impl ConfigInput {
    pub fn new(name: impl Into<String>, host: impl Into<String>, device_class: DeviceClass) -> Self {
        Self {
            name: Some(name.into()),
            host: Some(host.into()),
            device_class: Some(device_class.as_str().to_string()),
            access_token: None,
            volume_step: None,
        }
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }
}

/// One device declared in static configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub host: String,
    #[serde(default)]
    pub device_class: DeviceClass,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_volume_step")]
    pub volume_step: u8,
}

impl ImportConfig {
    pub fn to_input(&self) -> ConfigInput {
        ConfigInput {
            name: Some(self.name.clone()),
            host: Some(self.host.clone()),
            device_class: Some(self.device_class.as_str().to_string()),
            access_token: self.access_token.clone(),
            volume_step: Some(self.volume_step),
        }
    }
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_volume_step() -> u8 {
    DEFAULT_VOLUME_STEP
}

/// Service record announced by a device on the local network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryInfo {
    pub host: String,
    pub port: u16,
    /// Advertised instance name, e.g. `Living Room._viziocast._tcp.local.`
    pub name: String,
    /// Service type, e.g. `_viziocast._tcp.local.`
    pub service_type: String,
}

/// Turn an advertised instance name into a human readable device name.
pub fn strip_service_type(name: &str, service_type: &str) -> String {
    name.strip_suffix(service_type)
        .map(|rest| rest.strip_suffix('.').unwrap_or(rest))
        .unwrap_or(name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_service_type_removes_suffix_and_separator() {
        assert_eq!(
            strip_service_type("Living Room._viziocast._tcp.local.", "_viziocast._tcp.local."),
            "Living Room"
        );
    }

    #[test]
    fn strip_service_type_keeps_unrelated_names() {
        assert_eq!(strip_service_type("Kitchen", "_viziocast._tcp.local."), "Kitchen");
    }

    #[test]
    fn import_config_carries_volume_step_into_input() {
        let config = ImportConfig {
            name: "Den".to_string(),
            host: "10.0.0.2".to_string(),
            device_class: DeviceClass::Speaker,
            access_token: None,
            volume_step: 4,
        };

        let input = config.to_input();

        assert_eq!(input.device_class.as_deref(), Some("speaker"));
        assert_eq!(input.volume_step, Some(4));
    }
}
