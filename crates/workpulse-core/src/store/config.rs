//! TOML-based application configuration.
//!
//! Stores the deployment-specific knobs:
//! - Sweep policy literals (thresholds, cool-downs, UTC offset)
//! - Push gateway endpoint and API key
//! - Database path and report directory overrides
//!
//! Configuration lives at `<data_dir>/config.toml`. Every field has a
//! default matching the reference deployment, so an empty file (or none at
//! all) reproduces the reference behavior.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::policy::SweepPolicy;

/// Push gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Server API key sent as the authorization header. Empty disables
    /// the header (useful against local test gateways).
    #[serde(default)]
    pub server_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Storage location overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; defaults to `<data_dir>/workpulse.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Run-report directory; defaults to `<data_dir>/reports`.
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sweep: SweepPolicy,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

// Default functions
fn default_endpoint() -> String {
    "https://fcm.googleapis.com/fcm/send".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            server_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep: SweepPolicy::default(),
            push: PushConfig::default(),
            storage: StorageConfig::default(),
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
    ) -> Result<(), String> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err("config key is empty".into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| format!("unknown config key: {key}"))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| format!("unknown config key: {key}"))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| format!("cannot parse '{value}' as bool: {e}"))?,
                    ),
                    serde_json::Value::Number(_) => {
                        // i64 first: offsets may be negative, and integer
                        // fields reject a float-shaped JSON number.
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| format!("cannot parse '{value}' as number"))?
                        } else {
                            return Err(format!("cannot parse '{value}' as number"));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| e.to_string())?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| format!("unknown config key: {key}"))?;
        }

        Err(format!("unknown config key: {key}"))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing (and returning) the default when no file
    /// exists yet.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and persist. Returns an error if the key
    /// is unknown or the value does not fit the field.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value).map_err(invalid)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        self.save()?;
        Ok(())
    }

    /// The full configuration as pretty TOML, for `config list`.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn dump(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: String::new(),
            message: e.to_string(),
        })
    }

    /// Resolved database path.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be resolved.
    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.db_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("workpulse.db")),
        }
    }

    /// Resolved run-report directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be resolved.
    pub fn report_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.report_dir {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("reports")),
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
        assert_eq!(parsed.sweep.max_resume_attempts, 3);
        assert_eq!(parsed.push.timeout_secs, 10);
    }

    #[test]
    fn empty_file_reproduces_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.sweep.utc_offset_hours, 3);
        assert_eq!(parsed.sweep.active_threshold_secs, 40);
        assert_eq!(parsed.push.endpoint, "https://fcm.googleapis.com/fcm/send");
        assert!(parsed.storage.db_path.is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("sweep.max_resume_attempts").as_deref(), Some("3"));
        assert_eq!(cfg.get("push.timeout_secs").as_deref(), Some("10"));
        assert_eq!(
            cfg.get("push.endpoint").as_deref(),
            Some("https://fcm.googleapis.com/fcm/send")
        );
        assert!(cfg.get("sweep.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "sweep.ping_gap_minutes", "30").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "sweep.ping_gap_minutes").unwrap(),
            &serde_json::Value::Number(30.into())
        );
    }

    #[test]
    fn set_json_value_by_path_accepts_negative_offset() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "sweep.utc_offset_hours", "-5").unwrap();
        let cfg: Config = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.sweep.utc_offset_hours, -5);
    }

    #[test]
    fn set_json_value_by_path_updates_nested_string() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "push.endpoint", "http://localhost:9090/send")
            .unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "push.endpoint").unwrap(),
            &serde_json::Value::String("http://localhost:9090/send".to_string())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "sweep.nonexistent_key", "1");
        assert!(result.is_err());
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result =
            Config::set_json_value_by_path(&mut json, "sweep.ping_gap_minutes", "not_a_number");
        assert!(result.is_err());
    }

    #[test]
    fn config_get_returns_string_for_all_types() {
        let cfg = Config::default();
        // Number
        assert_eq!(cfg.get("sweep.resume_cooldown_minutes"), Some("6".to_string()));
        // Float
        assert_eq!(cfg.get("sweep.proximity_tolerance"), Some("0.001".to_string()));
        // String (chrono NaiveTime serializes as a clock string)
        assert_eq!(cfg.get("sweep.stop_check_time"), Some("18:05:00".to_string()));
    }

    #[test]
    fn dump_lists_populated_sections() {
        let text = Config::default().dump().unwrap();
        assert!(text.contains("[sweep]"));
        assert!(text.contains("[push]"));
        assert!(text.contains("utc_offset_hours = 3"));
    }
}
