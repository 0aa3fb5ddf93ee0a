//! Options sub-flow model.
//!
//! A single numeric field, `volume_step`, edited on an existing entry.

use serde::{Deserialize, Serialize};

use crate::entry::{clamp_volume_step, ConfigEntry, EntryOptions};

/// Step identifier of the only options step.
pub const OPTIONS_STEP_ID: &str = "init";

/// Submitted options form. Out-of-range values are clamped, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsInput {
    pub volume_step: i64,
}

impl OptionsInput {
    pub fn into_options(self) -> EntryOptions {
        EntryOptions {
            volume_step: clamp_volume_step(self.volume_step),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsForm {
    pub step_id: String,
    pub volume_step: u8,
}

impl OptionsForm {
    pub fn for_entry(entry: &ConfigEntry) -> Self {
        Self {
            step_id: OPTIONS_STEP_ID.to_string(),
            volume_step: entry.options.volume_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submitted_volume_step_is_clamped() {
        assert_eq!(OptionsInput { volume_step: 0 }.into_options().volume_step, 1);
        assert_eq!(OptionsInput { volume_step: 5 }.into_options().volume_step, 5);
        assert_eq!(OptionsInput { volume_step: 11 }.into_options().volume_step, 10);
    }
}
