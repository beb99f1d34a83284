use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::models::User;

/// Environment variable overriding `api.base_url`.
pub const ENV_API_BASE_URL: &str = "AIM_API_BASE_URL";
/// Environment variable overriding `data.data_dir`.
pub const ENV_DATA_DIR: &str = "AIM_DATA_DIR";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api.base_url must start with http:// or https:// (got {0:?})")]
    InvalidBaseUrl(String),

    #[error("api.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("tui.tick_rate_ms must be greater than zero")]
    ZeroTickRate,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub tui: TuiConfig,
    pub user: UserConfig,
    pub data: DataConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base path every request is built from, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick interval in milliseconds for the event loop.
    pub tick_rate_ms: u64,
    /// Enable mouse support in the terminal.
    pub mouse_enabled: bool,
}

/// The signed-in user shown in the sidebar. There is no auth backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub name: String,
    pub role: String,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 50,
            mouse_enabled: false,
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: "Felix".to_string(),
            role: "PRODUCER".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/aim-studio/config.toml`, then apply
    /// environment overrides. Returns `Default` if the file is missing,
    /// unparseable or invalid.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e}, using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {}, using defaults",
                    config_path.display()
                );
                Self::default()
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());

        if let Err(e) = config.validate() {
            log::warn!("Invalid configuration: {e}, using defaults");
            return Self::default();
        }
        config
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|v| !v.trim().is_empty()) {
            log::debug!("{ENV_API_BASE_URL} overrides api.base_url");
            self.api.base_url = url.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.data.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.api.base_url.clone()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.tui.tick_rate_ms == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        Ok(())
    }

    pub fn user(&self) -> User {
        User {
            name: self.user.name.clone(),
            role: self.user.role.clone(),
        }
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("aim-studio"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("aim-studio").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
