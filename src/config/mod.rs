//! # Configuration Management
//!
//! Settings for the Gitvault service, loaded from an optional YAML file
//! and `GITVAULT_*` environment variables.

pub mod settings;

pub use settings::{AppConfig, ConfigServerConfig, ObservabilityConfig, ServerConfig};
