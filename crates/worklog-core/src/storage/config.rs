//! TOML-based application configuration.
//!
//! Stored at `~/.config/worklog/config.toml`. Holds the defaults used
//! to seed first-contact profiles and the filename suggested for CSV
//! exports.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::profile::ProfileDefaults;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seed values for new user profiles.
    #[serde(default)]
    pub defaults: ProfileDefaults,
    #[serde(default = "default_export_filename")]
    pub export_filename: String,
}

fn default_export_filename() -> String {
    "export.csv".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defaults: ProfileDefaults::default(),
            export_filename: default_export_filename(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the default config on first run.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                Ok(config)
            }
            Err(_) => {
                let config = Self::default();
                config.save()?;
                Ok(config)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.defaults.timezone, 0);
        assert_eq!(parsed.defaults.projects, ["Work", "Sport", "Education", "Portfolio"]);
        assert_eq!(parsed.export_filename, "export.csv");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.export_filename, "export.csv");
        assert_eq!(parsed.defaults.projects.len(), 4);
    }

    #[test]
    fn defaults_section_is_overridable() {
        let parsed: Config =
            toml::from_str("[defaults]\ntimezone = 2\nprojects = [\"Solo\"]\n").unwrap();
        assert_eq!(parsed.defaults.timezone, 2);
        assert_eq!(parsed.defaults.projects, ["Solo"]);
    }
}
