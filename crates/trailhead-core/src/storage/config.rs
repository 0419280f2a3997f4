//! TOML-based application configuration.
//!
//! Stores engine tuning:
//! - Step economy rates (steps per completed goal, minutes per step)
//! - Remote classifier endpoint and timeout
//!
//! Configuration is stored at `~/.config/trailhead/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Step economy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Steps awarded per completed goal.
    #[serde(default = "default_steps_per_goal")]
    pub steps_per_goal: u32,
    /// Minutes of net productive time per earned step.
    #[serde(default = "default_minutes_per_step")]
    pub minutes_per_step: u32,
}

/// Remote classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Endpoint of the external classification model. When unset, unknown
    /// apps get the neutral default classification.
    #[serde(default)]
    pub remote_endpoint: Option<String>,
    /// Request timeout for the remote classifier, in seconds.
    #[serde(default = "default_remote_timeout_secs")]
    pub remote_timeout_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/trailhead/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

fn default_steps_per_goal() -> u32 {
    3
}
fn default_minutes_per_step() -> u32 {
    60
}
fn default_remote_timeout_secs() -> u64 {
    5
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            steps_per_goal: default_steps_per_goal(),
            minutes_per_step: default_minutes_per_step(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            remote_endpoint: None,
            remote_timeout_secs: default_remote_timeout_secs(),
        }
    }
}

impl Config {
    /// Path of the config file inside the data directory.
    pub fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults if the file does
    /// not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Persist the configuration.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })
    }
}
