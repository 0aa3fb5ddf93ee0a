use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Kind of device being configured.
///
/// TVs need an access token obtained through pairing; speakers are usable
/// without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    #[default]
    Tv,
    Speaker,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Tv => "tv",
            DeviceClass::Speaker => "speaker",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown device class: {0}")]
pub struct UnknownDeviceClass(pub String);

impl FromStr for DeviceClass {
    type Err = UnknownDeviceClass;

    /// Parsing is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tv" => Ok(DeviceClass::Tv),
            "speaker" => Ok(DeviceClass::Speaker),
            _ => Err(UnknownDeviceClass(s.to_string())),
        }
    }
}

impl Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("TV".parse::<DeviceClass>(), Ok(DeviceClass::Tv));
        assert_eq!("Speaker".parse::<DeviceClass>(), Ok(DeviceClass::Speaker));
    }

    #[test]
    fn parse_rejects_unknown_class() {
        let err = "soundbar".parse::<DeviceClass>().unwrap_err();
        assert_eq!(err, UnknownDeviceClass("soundbar".to_string()));
    }

    #[test]
    fn display_matches_parse_input() {
        assert_eq!(DeviceClass::Speaker.to_string(), "speaker");
        assert_eq!(DeviceClass::default(), DeviceClass::Tv);
    }
}
