use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::sync::engine::EngineConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_min_syncing_ms")]
    pub min_syncing_ms: u64,
    #[serde(default = "default_stuck_submission_min")]
    pub stuck_submission_min: i64,
}

fn default_debounce_ms() -> u64 {
    750
}
fn default_min_syncing_ms() -> u64 {
    400
}
fn default_stuck_submission_min() -> i64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            debounce_ms: default_debounce_ms(),
            min_syncing_ms: default_min_syncing_ms(),
            stuck_submission_min: default_stuck_submission_min(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("draftsheet")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".draftsheet")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("draftsheet.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("draftsheet.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|_| AppError::ConfigLoad)?;
            serde_yaml::from_str(&content).map_err(|_| AppError::ConfigLoad)
        } else {
            Ok(Config::default())
        }
    }

    /// Write the configuration file, creating the directory when needed.
    pub fn save(&self) -> AppResult<()> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir).map_err(|_| AppError::ConfigSave)?;

        let yaml = serde_yaml::to_string(self).map_err(|_| AppError::ConfigSave)?;
        fs::write(Self::config_file(), yaml).map_err(|_| AppError::ConfigSave)?;
        Ok(())
    }

    /// Timing knobs for the sync engine.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            min_syncing: Duration::from_millis(self.min_syncing_ms),
        }
    }
}
