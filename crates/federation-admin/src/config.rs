//! Configuration loading

use anyhow::{Context, Result};
use federation_proxy::ManagementClientConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Broker management API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Base URL of the management interface
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_credential")]
    pub username: Option<String>,
    #[serde(default = "default_credential")]
    pub password: Option<String>,
    #[serde(default)]
    pub skip_tls_verify: bool,
    /// Per-request timeout, unlimited when unset
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_credential(),
            password: default_credential(),
            skip_tls_verify: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BrokerConfig {
    /// Transport configuration for this broker
    pub fn client_config(&self) -> ManagementClientConfig {
        ManagementClientConfig {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            skip_tls_verify: self.skip_tls_verify,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_url() -> String {
    "http://localhost:15672".to_string()
}

fn default_credential() -> Option<String> {
    Some("guest".to_string())
}

fn default_timeout_secs() -> Option<u64> {
    Some(30)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Apply command-line and environment overrides
    pub fn apply_overrides(
        &mut self,
        url: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) {
        if let Some(url) = url {
            self.broker.url = url;
        }
        if username.is_some() {
            self.broker.username = username;
        }
        if password.is_some() {
            self.broker.password = password;
        }
    }
}
