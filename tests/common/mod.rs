//! Shared fixtures for integration tests.
//!
//! Builds the full service graph over a temporary base directory, with
//! direct access to the cache and notification log so tests can assert
//! on invalidation behavior.

// Not every test binary exercises every fixture.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use gitvault::cache::CacheManager;
use gitvault::config::ConfigServerConfig;
use gitvault::crypto::Cipher;
use gitvault::notify::{Notifier, NotifyStore};
use gitvault::resolver::Resolver;
use gitvault::secrets::SecretProcessor;
use gitvault::storage::{ConfigStore, RepoGateway, VaultStore};

pub const TEST_EMAIL: &str = "dev@example.com";

pub struct TestEnv {
    // Held so the base directory outlives the services.
    _dir: TempDir,
    pub store: Arc<ConfigStore>,
    pub vault: Arc<VaultStore>,
    pub resolver: Arc<Resolver>,
    pub notify_store: Arc<NotifyStore>,
    pub cache: Arc<CacheManager>,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp base dir");
        let settings = ConfigServerConfig {
            base_path: dir.path().to_string_lossy().to_string(),
            ..Default::default()
        };

        let cipher = Arc::new(Cipher::from_key([11u8; 32]));
        let cache = Arc::new(CacheManager::new(Duration::from_secs(600)));
        let gateway = Arc::new(RepoGateway::new(dir.path()));

        let vault =
            Arc::new(VaultStore::new(Arc::clone(&gateway), cipher, Arc::clone(&cache)));
        let secrets = Arc::new(SecretProcessor::new(Arc::clone(&vault)));

        let notify_store = Arc::new(NotifyStore::new());
        let notifier = Arc::new(Notifier::new(&settings, Arc::clone(&notify_store)));

        let store = Arc::new(ConfigStore::new(
            gateway,
            Arc::clone(&secrets),
            Arc::clone(&cache),
            notifier,
            Arc::clone(&notify_store),
            settings.commit_history_size,
        ));
        let resolver = Arc::new(Resolver::new(Arc::clone(&store), secrets));

        Self { _dir: dir, store, vault, resolver, notify_store, cache }
    }
}

/// Build an update request with the given content and base commit.
pub fn update_request(
    app_name: &str,
    content: &str,
    expected_commit_id: &str,
) -> gitvault::storage::config_store::UpdateRequest {
    gitvault::storage::config_store::UpdateRequest {
        app_name: app_name.to_string(),
        content: content.to_string(),
        message: format!("Update {}", app_name),
        email: TEST_EMAIL.to_string(),
        expected_commit_id: expected_commit_id.to_string(),
    }
}
