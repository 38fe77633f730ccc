//! TOML-based application configuration.
//!
//! Stores the user's alarm defaults:
//! - Wake time and audio file
//! - Maximum volume and fade-in duration
//! - Snooze length and recurrence
//! - Session loop timing
//!
//! Configuration is stored at `~/.config/wakeroom/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::alarm::{
    valid_fade_in_secs, Recurrence, DEFAULT_FADE_IN_SECS, DEFAULT_MAX_VOLUME, MAX_FADE_IN_SECS,
};
use crate::error::ConfigError;
use crate::ring::DEFAULT_SNOOZE_MINUTES;

/// Alarm defaults. Command-line flags override these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// Default wake time, `HH:MM` 24-hour.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub audio_file: Option<String>,
    #[serde(default = "default_max_volume")]
    pub max_volume: f32,
    #[serde(default = "default_fade_in_secs")]
    pub fade_in_secs: f64,
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u32,
    #[serde(default)]
    pub recurrence: Recurrence,
}

/// Interactive session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How often the fade ramp is ticked.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/wakeroom/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

// Default functions
fn default_max_volume() -> f32 {
    DEFAULT_MAX_VOLUME
}
fn default_fade_in_secs() -> f64 {
    DEFAULT_FADE_IN_SECS
}
fn default_snooze_minutes() -> u32 {
    DEFAULT_SNOOZE_MINUTES
}
fn default_tick_interval_ms() -> u64 {
    50
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            time: None,
            audio_file: None,
            max_volume: default_max_volume(),
            fade_in_secs: default_fade_in_secs(),
            snooze_minutes: default_snooze_minutes(),
            recurrence: Recurrence::Once,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Unset optionals clear with an empty string.
                    serde_json::Value::Null | serde_json::Value::String(_) if value.is_empty() => {
                        serde_json::Value::Null
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config file location.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key, keeping its type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is unchanged on error.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Update a value and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.update(key, value)?;
        self.save()
    }

    /// Check ranges the alarm relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let alarm = &self.alarm;
        if !(alarm.max_volume > 0.0 && alarm.max_volume <= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "alarm.max_volume".into(),
                message: format!("must be in (0, 1], got {}", alarm.max_volume),
            });
        }
        if !valid_fade_in_secs(alarm.fade_in_secs) {
            return Err(ConfigError::InvalidValue {
                key: "alarm.fade_in_secs".into(),
                message: format!(
                    "must be in (0, {MAX_FADE_IN_SECS}] seconds, got {}",
                    alarm.fade_in_secs
                ),
            });
        }
        if alarm.snooze_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "alarm.snooze_minutes".into(),
                message: "must be at least 1".into(),
            });
        }
        if let Some(time) = alarm.time.as_deref() {
            crate::alarm::parse_time_of_day(time).map_err(|e| ConfigError::InvalidValue {
                key: "alarm.time".into(),
                message: e.to_string(),
            })?;
        }
        if self.session.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "session.tick_interval_ms".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
