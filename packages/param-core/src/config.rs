//! Application configuration.
//!
//! Supports TOML config files, environment variable overrides, and defaults.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ParamError, Result};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Data directory for the file-backed store
    pub data_dir: PathBuf,
    /// Version string written into backup snapshots
    pub backup_version: String,
    /// Username seeded when no users exist
    pub default_admin_username: String,
    /// Password seeded when no users exist
    pub default_admin_password: String,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            backup_version: "1.0.0".to_string(),
            default_admin_username: "admin".to_string(),
            default_admin_password: "admin123".to_string(),
            persistence_max_retries: 3,
            persistence_retry_delay_ms: 100,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ParamError::ConfigError(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string. Missing keys take defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| ParamError::ConfigError(format!("Invalid TOML: {}", e)))
    }

    /// Applies environment variable overrides.
    ///
    /// Variables are prefixed with `PARAM_`, e.g. `PARAM_DATA_DIR=/path`.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("PARAM_DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("PARAM_BACKUP_VERSION") {
            self.backup_version = val;
        }
        if let Ok(val) = env::var("PARAM_MAX_RETRIES") {
            self.persistence_max_retries = val
                .parse()
                .map_err(|_| ParamError::ConfigError(format!("Invalid PARAM_MAX_RETRIES: {}", val)))?;
        }
        if let Ok(val) = env::var("PARAM_RETRY_DELAY_MS") {
            self.persistence_retry_delay_ms = val.parse().map_err(|_| {
                ParamError::ConfigError(format!("Invalid PARAM_RETRY_DELAY_MS: {}", val))
            })?;
        }
        Ok(())
    }
}
