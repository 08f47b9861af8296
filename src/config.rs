//! Persistent application configuration, stored as pretty-printed JSON.

use crate::automation::config::{CalibrationConfig, CaptureConfig};
use crate::vision::config::MatchConfig;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "minimap-autoplay.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config {path:?} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding `<name>.png` templates and their `.json` sidecars
    pub templates_dir: PathBuf,
    /// Directory holding the minimap corner and player marker images
    pub anchors_dir: PathBuf,
    pub capture: CaptureConfig,
    pub calibration: CalibrationConfig,
    pub matching: MatchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            anchors_dir: PathBuf::from("assets"),
            capture: CaptureConfig::default(),
            calibration: CalibrationConfig::default(),
            matching: MatchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, falling back to defaults (with a warning) on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️ {}; using default configuration", e);
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("minimap-autoplay-config-{}-{}.json", tag, std::process::id()))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = AppConfig::try_load(&temp_file("missing")).expect("missing file is fine");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.calibration.insets.top, 5);
        assert_eq!(config.capture.fallback_region.width, 1440);
        assert_eq!(config.matching.suppression_threshold, 0.3);
    }

    #[test]
    fn test_partial_file_fills_defaults_and_round_trips() {
        let path = temp_file("partial");
        fs::write(&path, r#"{"templates_dir": "mine", "calibration": {"player_floor": 0.9}}"#)
            .expect("write config");

        let config = AppConfig::try_load(&path).expect("valid config");
        assert_eq!(config.templates_dir, PathBuf::from("mine"));
        assert_eq!(config.calibration.player_floor, 0.9);
        assert_eq!(config.calibration.top_left_floor, 0.8);

        config.save(&path).expect("save");
        assert_eq!(AppConfig::try_load(&path).expect("reload"), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let path = temp_file("corrupt");
        fs::write(&path, "{ not json").expect("write config");
        assert!(matches!(AppConfig::try_load(&path), Err(ConfigError::Parse { .. })));
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
        let _ = fs::remove_file(&path);
    }
}
