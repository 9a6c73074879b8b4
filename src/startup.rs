//! Component wiring at process start.

use std::sync::Arc;

use crate::api::ApiState;
use crate::cache::CacheManager;
use crate::config::AppConfig;
use crate::crypto::Cipher;
use crate::errors::Result;
use crate::notify::{Notifier, NotifyStore};
use crate::resolver::Resolver;
use crate::secrets::SecretProcessor;
use crate::storage::{ConfigStore, RepoGateway, VaultStore};

/// Build the full service graph from loaded settings. Fails when the
/// base directory is missing or the master key cannot be loaded.
pub fn build_state(config: &AppConfig) -> Result<ApiState> {
    config.ensure_base_path()?;

    let settings = &config.configserver;
    let cipher = Arc::new(Cipher::from_settings(settings)?);
    let cache = Arc::new(CacheManager::new(settings.cache_ttl()));
    let gateway = Arc::new(RepoGateway::new(settings.base_path.clone()));

    let vault = Arc::new(VaultStore::new(
        Arc::clone(&gateway),
        Arc::clone(&cipher),
        Arc::clone(&cache),
    ));
    let secrets = Arc::new(SecretProcessor::new(Arc::clone(&vault)));

    let notify_store = Arc::new(NotifyStore::new());
    let notifier = Arc::new(Notifier::new(settings, Arc::clone(&notify_store)));

    let store = Arc::new(ConfigStore::new(
        gateway,
        Arc::clone(&secrets),
        cache,
        Arc::clone(&notifier),
        notify_store,
        settings.commit_history_size,
    ));
    let resolver = Arc::new(Resolver::new(Arc::clone(&store), secrets));

    Ok(ApiState { store, vault, resolver, notifier })
}
