//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Price model parameters
//! - Session rules (selectable dates, placeholder story)
//! - Log level
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::diary::DEFAULT_PLACEHOLDER_STORY;
use crate::error::ConfigError;
use crate::price::{PriceModel, DEFAULT_ANCHOR_PRICE, DEFAULT_RATE_PER_MINUTE};
use crate::session::SessionSettings;

/// Price model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConfig {
    #[serde(default = "default_rate_per_minute")]
    pub rate_per_minute: f64,
    #[serde(default = "default_anchor")]
    pub default_anchor: f64,
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Allow logging the current day (otherwise the latest day is yesterday).
    #[serde(default = "default_true")]
    pub include_today: bool,
    #[serde(default = "default_placeholder_story")]
    pub placeholder_story: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when DAYMARKET_LOG / RUST_LOG are unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub price: PriceConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_rate_per_minute() -> f64 {
    DEFAULT_RATE_PER_MINUTE
}
fn default_anchor() -> f64 {
    DEFAULT_ANCHOR_PRICE
}
fn default_true() -> bool {
    true
}
fn default_placeholder_story() -> String {
    DEFAULT_PLACEHOLDER_STORY.into()
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            rate_per_minute: default_rate_per_minute(),
            default_anchor: default_anchor(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            include_today: true,
            placeholder_story: default_placeholder_story(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

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
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
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

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The caller persists with [`Config::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject values the session cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.price.rate_per_minute.is_finite() && self.price.rate_per_minute >= 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "price.rate_per_minute".into(),
                message: "must be a finite, non-negative number".into(),
            });
        }
        if !(self.price.default_anchor.is_finite() && self.price.default_anchor > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "price.default_anchor".into(),
                message: "must be a finite, positive number".into(),
            });
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".into(),
                message: format!("expected one of {}", LOG_LEVELS.join(", ")),
            });
        }
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            model: PriceModel::new(self.price.rate_per_minute),
            default_anchor: self.price.default_anchor,
            include_today: self.session.include_today,
            placeholder_story: self.session.placeholder_story.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.price.rate_per_minute, 0.0004);
        assert_eq!(parsed.price.default_anchor, 1000.0);
        assert!(parsed.session.include_today);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[session]\ninclude_today = false\n").unwrap();
        assert!(!parsed.session.include_today);
        assert_eq!(parsed.session.placeholder_story, DEFAULT_PLACEHOLDER_STORY);
        assert_eq!(parsed.logging.level, "warn");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("session.include_today").as_deref(), Some("true"));
        assert_eq!(cfg.get("price.default_anchor").as_deref(), Some("1000.0"));
        assert_eq!(cfg.get("logging.level").as_deref(), Some("warn"));
        assert!(cfg.get("session.missing_key").is_none());
        assert!(cfg.get("price").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("session.include_today", "false").unwrap();
        cfg.set("price.rate_per_minute", "0.001").unwrap();
        cfg.set("session.placeholder_story", "Nothing yet").unwrap();
        assert!(!cfg.session.include_today);
        assert_eq!(cfg.price.rate_per_minute, 0.001);
        assert_eq!(cfg.session.placeholder_story, "Nothing yet");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("session.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("price", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_values_without_changes() {
        let mut cfg = Config::default();
        assert!(cfg.set("session.include_today", "sometimes").is_err());
        assert!(cfg.set("price.default_anchor", "-5").is_err());
        assert!(cfg.set("logging.level", "loud").is_err());
        assert!(cfg.session.include_today);
        assert_eq!(cfg.price.default_anchor, 1000.0);
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.price.default_anchor, 1000.0);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "price = 3").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn session_settings_follow_config() {
        let mut cfg = Config::default();
        cfg.set("price.default_anchor", "500").unwrap();
        let settings = cfg.session_settings();
        assert_eq!(settings.default_anchor, 500.0);
        assert_eq!(settings.model.rate_per_minute, 0.0004);
    }
}
