//! # Structured Logging
//!
//! Provides structured logging setup using the tracing ecosystem.

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured logging based on configuration
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = parse_env_filter(&config.log_level)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json_logging {
        // JSON structured logging for production
        let json_layer = fmt::layer().json().flatten_event(true).with_current_span(true);
        registry
            .with(json_layer)
            .try_init()
            .map_err(|e| Error::config(format!("Failed to initialize logging: {}", e)))?;
    } else {
        // Human-readable logging for development
        let pretty_layer = fmt::layer().with_target(true);
        registry
            .with(pretty_layer)
            .try_init()
            .map_err(|e| Error::config(format!("Failed to initialize logging: {}", e)))?;
    }

    Ok(())
}

fn parse_env_filter(level: &str) -> Result<EnvFilter> {
    let normalized = level.trim();
    match normalized.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => {
            return Err(Error::config(format!(
                "Invalid log level '{}': must be one of trace, debug, info, warn, error",
                level
            )));
        }
    }

    EnvFilter::try_new(normalized)
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", level, e)))
}

/// Log the loaded settings at startup
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        server_address = %config.server.bind_address(),
        base_path = %config.configserver.base_path,
        commit_history_size = config.configserver.commit_history_size,
        cache_ttl_seconds = config.configserver.cache_ttl_seconds,
        notify_targets = config.configserver.refresh_notify_url.len(),
        "Gitvault configuration loaded"
    );
}
