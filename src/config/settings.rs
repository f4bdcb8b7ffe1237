//! Application and device configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tinydash_types::DeviceConfig;

use crate::core::RetryPolicy;

/// Current config format version
pub const CONFIG_VERSION: u32 = 1;

/// Environment variable consulted when the config carries no token
pub const TOKEN_ENV: &str = "TINYDASH_HA_TOKEN";

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Application-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the config format
    #[serde(default = "default_version")]
    pub version: u32,
    /// Home Assistant connection, used by `run`
    #[serde(default)]
    pub home_assistant: Option<HomeAssistantConfig>,
    /// Snapshot file served instead of a live source
    #[serde(default)]
    pub snapshot_file: Option<PathBuf>,
    #[serde(default)]
    pub upload: UploadSettings,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "tinydash", "tinydash")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        if config.version > CONFIG_VERSION {
            log::warn!(
                "{} was written by a newer version (format {}), some settings may be ignored",
                path.display(),
                config.version
            );
        }
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Devices with every field clamped into range
    pub fn validated_devices(&self) -> Vec<DeviceConfig> {
        self.devices.iter().map(DeviceConfig::validated).collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            home_assistant: None,
            snapshot_file: None,
            upload: UploadSettings::default(),
            devices: Vec::new(),
        }
    }
}

/// Home Assistant REST connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    /// Base URL, e.g. `http://homeassistant.local:8123`
    pub url: String,
    /// Long-lived access token
    #[serde(default)]
    pub token: Option<String>,
}

impl HomeAssistantConfig {
    /// Token from the config, else from the environment
    pub fn token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV).ok())
    }
}

/// Upload retry tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSettings {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_attempts() -> u32 {
    RetryPolicy::default().max_attempts
}

fn default_timeout_ms() -> u64 {
    RetryPolicy::default().timeout.as_millis() as u64
}

fn default_initial_backoff_ms() -> u64 {
    RetryPolicy::default().initial_backoff.as_millis() as u64
}

fn default_max_backoff_ms() -> u64 {
    RetryPolicy::default().max_backoff.as_millis() as u64
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            timeout_ms: default_timeout_ms(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl From<UploadSettings> for RetryPolicy {
    fn from(settings: UploadSettings) -> Self {
        RetryPolicy {
            max_attempts: settings.attempts.clamp(1, 10),
            timeout: Duration::from_millis(settings.timeout_ms.max(100)),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms.max(settings.initial_backoff_ms)),
        }
    }
}
