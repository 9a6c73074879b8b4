//! # Configuration Settings
//!
//! Defines the configuration structure for the Gitvault service.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use validator::Validate;

/// Built-in development master key (base64, 32 bytes decoded). Only used
/// when neither `VAULT_MASTER_KEY` nor the settings file provides one.
pub const DEFAULT_MASTER_KEY: &str = "Z2l0dmF1bHQtZGV2LWRlZmF1bHQtbWFzdGVya2V5ISE=";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Logging configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    /// Core service configuration
    #[validate(nested)]
    pub configserver: ConfigServerConfig,
}

impl AppConfig {
    /// Load configuration from an optional file plus environment overrides.
    ///
    /// The file path defaults to `gitvault.yaml` and can be changed with
    /// `GITVAULT_CONFIG_FILE`. Environment variables use the `GITVAULT_`
    /// prefix with `__` as the section separator, e.g.
    /// `GITVAULT_CONFIGSERVER__BASE_PATH=/var/lib/gitvault`.
    pub fn load() -> Result<Self> {
        let config_file = std::env::var("GITVAULT_CONFIG_FILE")
            .unwrap_or_else(|_| "gitvault.yaml".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&config_file).required(false))
            .add_source(config::Environment::with_prefix("GITVAULT").separator("__"))
            .build()?;

        let app_config: AppConfig = settings.try_deserialize()?;
        app_config.validate_all()?;
        Ok(app_config)
    }

    /// Validate the entire configuration
    pub fn validate_all(&self) -> Result<()> {
        Validate::validate(self)
            .map_err(|e| Error::config(format!("Invalid configuration: {}", e)))?;
        self.validate_custom()
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        if self.configserver.base_path.trim().is_empty() {
            return Err(Error::config("configserver.base_path must be set"));
        }
        Ok(())
    }

    /// Check that the configured base directory exists; the process must
    /// refuse to start without it.
    pub fn ensure_base_path(&self) -> Result<()> {
        let base = Path::new(&self.configserver.base_path);
        if !base.is_dir() {
            return Err(Error::config(format!(
                "Base directory does not exist: {}",
                self.configserver.base_path
            )));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8888 }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

/// Core configuration for namespaces, vault, caching, and notifications
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ConfigServerConfig {
    /// Root directory under which namespace repositories live
    pub base_path: String,

    /// Base64-encoded 256-bit vault master key; the `VAULT_MASTER_KEY`
    /// environment variable takes precedence over this value
    pub vault_master_key: String,

    /// Maximum number of commits returned by history queries
    #[validate(range(min = 1, max = 200, message = "Commit history size must be 1..=200"))]
    pub commit_history_size: usize,

    /// Cache entry time-to-live in seconds
    #[validate(range(min = 1, max = 86400, message = "Cache TTL must be 1..=86400 seconds"))]
    pub cache_ttl_seconds: u64,

    /// Per-namespace refresh callback URLs
    pub refresh_notify_url: HashMap<String, String>,
}

impl Default for ConfigServerConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            vault_master_key: DEFAULT_MASTER_KEY.to_string(),
            commit_history_size: 20,
            cache_ttl_seconds: 600,
            refresh_notify_url: HashMap::new(),
        }
    }
}

impl ConfigServerConfig {
    /// Get cache TTL as Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Look up the refresh callback URL configured for a namespace
    pub fn refresh_url(&self, namespace: &str) -> Option<&str> {
        self.refresh_notify_url.get(namespace).map(String::as_str).filter(|u| !u.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_needs_base_path() {
        let config = AppConfig::default();
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_config_with_base_path_validates() {
        let mut config = AppConfig::default();
        config.configserver.base_path = "/tmp/gitvault".to_string();
        assert!(config.validate_all().is_ok());
    }

    #[test]
    fn test_server_bind_address() {
        let config = ServerConfig { host: "0.0.0.0".to_string(), port: 8888 };
        assert_eq!(config.bind_address(), "0.0.0.0:8888");
    }

    #[test]
    fn test_cache_ttl_duration() {
        let config = ConfigServerConfig { cache_ttl_seconds: 300, ..Default::default() };
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_commit_history_size_range() {
        let mut config = AppConfig::default();
        config.configserver.base_path = "/tmp/gitvault".to_string();
        config.configserver.commit_history_size = 0;
        assert!(config.validate_all().is_err());

        config.configserver.commit_history_size = 500;
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_refresh_url_lookup() {
        let mut config = ConfigServerConfig::default();
        config.refresh_notify_url.insert("prod".to_string(), "http://localhost:9000/refresh".to_string());
        config.refresh_notify_url.insert("blank".to_string(), "  ".to_string());

        assert_eq!(config.refresh_url("prod"), Some("http://localhost:9000/refresh"));
        assert_eq!(config.refresh_url("blank"), None);
        assert_eq!(config.refresh_url("missing"), None);
    }

    #[test]
    fn test_default_master_key_is_valid_base64() {
        use base64::Engine;
        let decoded =
            base64::engine::general_purpose::STANDARD.decode(DEFAULT_MASTER_KEY).unwrap();
        assert_eq!(decoded.len(), 32);
    }
}
