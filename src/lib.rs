//! # Gitvault
//!
//! Gitvault is a Git-backed configuration and secret management service
//! for distributed applications. Configuration is organized into
//! isolated namespaces, each backed by its own local Git repository
//! with full commit history; sensitive values live in an encrypted
//! per-namespace vault and are substituted on the read path.
//!
//! ## Architecture
//!
//! ```text
//! Management API ─┐                    ┌─ Cache regions
//!                 ├─ ConfigStore ── RepoGateway ── per-namespace Git repos
//! Resolver API ───┘        │               │
//!                   SecretProcessor ── VaultStore ── encrypted vault files
//!                          │
//!                       Notifier ── refresh callbacks + notification log
//! ```
//!
//! ## Core Components
//!
//! - **RepoGateway**: serialized, scoped access to namespace repositories
//! - **ConfigStore**: file-level CRUD with optimistic concurrency
//! - **VaultStore + Cipher**: AES-256-GCM encrypted secret storage
//! - **Resolver**: merged, secret-substituted property views for pull clients
//! - **CacheManager**: named TTL regions with precise write invalidation

pub mod api;
pub mod cache;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod notify;
pub mod observability;
pub mod resolver;
pub mod secrets;
pub mod startup;
pub mod storage;
pub mod validation;
pub mod yamlops;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
