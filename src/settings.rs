use serde::{Deserialize, Serialize};

use crate::ai::{MAX_STRENGTH, MIN_STRENGTH};
use crate::error::SettingsError;
use crate::types::Color;

/// User preferences a session is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub strength: u8,
    /// Whether new games are eligible for high scores.
    pub competitive: bool,
    pub human_color: Color,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strength: MIN_STRENGTH,
            competitive: false,
            human_color: Color::A,
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(MIN_STRENGTH..=MAX_STRENGTH).contains(&self.strength) {
            return Err(SettingsError::StrengthOutOfRange(self.strength));
        }
        if self.human_color.is_none() {
            return Err(SettingsError::NoHumanColor);
        }
        Ok(())
    }
}
