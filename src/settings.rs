//! User settings persisted in local storage
//!
//! Settings live as one JSON object under a fixed storage key. Loading never
//! fails: an absent or corrupt entry yields the defaults, and a partially
//! valid object is merged field by field, so one bad value only costs that
//! one field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::LocalStorage;

/// Storage key the settings object is kept under
pub const SETTINGS_KEY: &str = "vorex-settings";

/// Upper bound for the daily goal (one day)
const MAX_DAILY_GOAL_MINUTES: u32 = 24 * 60;

/// Errors that can occur when changing or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Writing to local storage failed
    #[error("Failed to write settings: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be encoded
    #[error("Failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),

    /// No such settings field
    #[error("Unknown setting: '{0}'")]
    UnknownField(String),

    /// The value does not fit the field
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Colour scheme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

/// Learner preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Language being learned (ISO 639-1 code)
    pub target_language: String,
    /// Practice goal per day in minutes
    pub daily_goal_minutes: u32,
    /// Whether practice reminders are sent
    pub notifications_enabled: bool,
    /// Whether lesson sound effects play
    pub sound_effects: bool,
    /// Local time of the daily reminder, `HH:MM`
    pub reminder_time: String,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_language: "es".to_string(),
            daily_goal_minutes: 15,
            notifications_enabled: true,
            sound_effects: true,
            reminder_time: "19:00".to_string(),
            theme: Theme::System,
        }
    }
}

impl Settings {
    /// Loads settings from storage, falling back to defaults per field.
    pub fn load(storage: &LocalStorage) -> Self {
        match storage.get_item(SETTINGS_KEY) {
            Some(raw) => Self::from_stored(&raw),
            None => {
                debug!("No stored settings, using defaults");
                Self::default()
            }
        }
    }

    /// Builds settings from a stored string.
    ///
    /// Every stored field that is known and valid replaces its default;
    /// unknown, mistyped or out-of-range fields are ignored.
    pub fn from_stored(raw: &str) -> Self {
        let defaults = Self::default();

        let stored = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(stored)) => stored,
            Ok(_) | Err(_) => {
                warn!("Stored settings are corrupt, using defaults");
                return defaults;
            }
        };
        let Some(mut merged) = defaults.to_map() else {
            return defaults;
        };

        for (field, value) in stored {
            if !merged.contains_key(&field) {
                debug!(field = %field, "Ignoring unknown stored setting");
                continue;
            }
            let mut candidate = merged.clone();
            candidate.insert(field.clone(), value);
            match Self::from_map(candidate.clone()) {
                Ok(_) => merged = candidate,
                Err(reason) => warn!(field = %field, %reason, "Ignoring invalid stored setting"),
            }
        }

        Self::from_map(merged).unwrap_or(defaults)
    }

    /// Writes the settings to storage.
    pub fn save(&self, storage: &LocalStorage) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        storage.set_item(SETTINGS_KEY, &json)?;
        Ok(())
    }

    /// Deletes stored settings and returns the defaults.
    pub fn reset(storage: &LocalStorage) -> Result<Self, SettingsError> {
        storage.remove_item(SETTINGS_KEY)?;
        Ok(Self::default())
    }

    /// Sets one field from its textual form.
    ///
    /// `raw` is parsed as JSON first (`30`, `false`, `"dark"`) and taken as
    /// a plain string if that fails, so `dark` and `"dark"` are equivalent.
    pub fn set_field(&mut self, field: &str, raw: &str) -> Result<(), SettingsError> {
        let mut map = self.to_map().ok_or_else(|| SettingsError::UnknownField(field.to_string()))?;
        if !map.contains_key(field) {
            return Err(SettingsError::UnknownField(field.to_string()));
        }

        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        map.insert(field.to_string(), value);

        *self = Self::from_map(map).map_err(|reason| SettingsError::InvalidValue {
            field: field.to_string(),
            reason,
        })?;
        Ok(())
    }

    /// Checks constraints the type system does not express.
    pub fn validate(&self) -> Result<(), String> {
        if self.daily_goal_minutes == 0 || self.daily_goal_minutes > MAX_DAILY_GOAL_MINUTES {
            return Err(format!(
                "daily goal must be between 1 and {} minutes",
                MAX_DAILY_GOAL_MINUTES
            ));
        }
        if !is_clock_time(&self.reminder_time) {
            return Err(format!("'{}' is not a HH:MM time", self.reminder_time));
        }
        if self.target_language.trim().is_empty() {
            return Err("target language must not be empty".to_string());
        }
        Ok(())
    }

    fn to_map(&self) -> Option<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    fn from_map(map: Map<String, Value>) -> Result<Self, String> {
        let settings: Self = serde_json::from_value(Value::Object(map)).map_err(|e| e.to_string())?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Whether `s` is a 24-hour `HH:MM` time
fn is_clock_time(s: &str) -> bool {
    let Some((hours, minutes)) = s.split_once(':') else {
        return false;
    };
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return false;
    }
    matches!((hours.parse::<u8>(), minutes.parse::<u8>()), (Ok(h), Ok(m)) if h < 24 && m < 60)
}
