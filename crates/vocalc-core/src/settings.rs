//! User preferences for a calculator session.
//!
//! Settings load from YAML or JSON (missing keys take their defaults) and
//! every mutation goes through a validating setter.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evaluator::MAX_DECIMAL_PLACES;
use crate::types::{AngleUnit, Theme};

/// Slowest and fastest allowed speech rate.
pub const VOICE_SPEED_RANGE: (f32, f32) = (0.1, 10.0);

/// Errors from loading or changing settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    voice_feedback: bool,
    auto_speak: bool,
    language: String,
    theme: Theme,
    decimal_places: u8,
    voice_speed: f32,
    angle_unit: AngleUnit,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            voice_feedback: true,
            auto_speak: false,
            language: "en-US".to_string(),
            theme: Theme::Dark,
            decimal_places: 2,
            voice_speed: 0.9,
            angle_unit: AngleUnit::Degrees,
        }
    }
}

impl Settings {
    /// Parse settings from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load a settings file. `.json` files are read as JSON, anything else
    /// as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        check_decimal_places(self.decimal_places)?;
        check_voice_speed(self.voice_speed)?;
        check_language(&self.language)?;
        Ok(())
    }

    pub fn voice_feedback(&self) -> bool {
        self.voice_feedback
    }

    pub fn set_voice_feedback(&mut self, enabled: bool) {
        self.voice_feedback = enabled;
    }

    pub fn auto_speak(&self) -> bool {
        self.auto_speak
    }

    pub fn set_auto_speak(&mut self, enabled: bool) {
        self.auto_speak = enabled;
    }

    /// BCP 47 tag used for recognition and synthesis.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) -> Result<(), SettingsError> {
        let language = language.into();
        check_language(&language)?;
        self.language = language;
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn decimal_places(&self) -> u8 {
        self.decimal_places
    }

    pub fn set_decimal_places(&mut self, places: u8) -> Result<(), SettingsError> {
        check_decimal_places(places)?;
        self.decimal_places = places;
        Ok(())
    }

    pub fn voice_speed(&self) -> f32 {
        self.voice_speed
    }

    pub fn set_voice_speed(&mut self, speed: f32) -> Result<(), SettingsError> {
        check_voice_speed(speed)?;
        self.voice_speed = speed;
        Ok(())
    }

    pub fn angle_unit(&self) -> AngleUnit {
        self.angle_unit
    }

    pub fn set_angle_unit(&mut self, unit: AngleUnit) {
        self.angle_unit = unit;
    }

    /// Flip between degrees and radians, returning the new unit.
    pub fn toggle_angle_unit(&mut self) -> AngleUnit {
        self.angle_unit = self.angle_unit.toggled();
        self.angle_unit
    }
}

fn check_decimal_places(places: u8) -> Result<(), SettingsError> {
    if places > MAX_DECIMAL_PLACES {
        return Err(SettingsError::Invalid {
            field: "decimal_places",
            reason: format!("{} exceeds the maximum of {}", places, MAX_DECIMAL_PLACES),
        });
    }
    Ok(())
}

fn check_voice_speed(speed: f32) -> Result<(), SettingsError> {
    let (min, max) = VOICE_SPEED_RANGE;
    if !(min..=max).contains(&speed) {
        return Err(SettingsError::Invalid {
            field: "voice_speed",
            reason: format!("{} is outside {}..={}", speed, min, max),
        });
    }
    Ok(())
}

fn check_language(language: &str) -> Result<(), SettingsError> {
    if language.trim().is_empty() {
        return Err(SettingsError::Invalid {
            field: "language",
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}
