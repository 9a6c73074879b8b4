//! # Cache Regions
//!
//! Named in-memory cache regions with TTL and bounded capacity. Values
//! are immutable `Arc` snapshots; readers never observe partial writes.
//! Writers invalidate through the single table of `on_*` methods so the
//! eviction policy lives in one place instead of being scattered across
//! call sites.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::notify::NamespaceNotifications;
use crate::storage::{CommitChanges, FileHistory, NamespaceEvents};

/// Upper bound on entries held by a single region.
const MAX_ENTRIES_PER_REGION: usize = 500;

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: Arc<T>,
    inserted_at: Instant,
}

/// A single named cache region.
#[derive(Debug)]
pub struct Region<T> {
    name: &'static str,
    entries: DashMap<String, CacheEntry<T>>,
    ttl: Duration,
    capacity: usize,
}

impl<T: Send + Sync + 'static> Region<T> {
    fn new(name: &'static str, ttl: Duration) -> Self {
        Self { name, entries: DashMap::new(), ttl, capacity: MAX_ENTRIES_PER_REGION }
    }

    /// Fetch a live snapshot; expired entries are dropped on access.
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(Arc::clone(&entry.value));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
            debug!(region = self.name, key, "Cache entry expired");
        }
        None
    }

    /// Insert a snapshot, evicting the oldest entry when the region is full.
    pub fn put<K: Into<String>>(&self, key: K, value: T) {
        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries
            .insert(key, CacheEntry { value: Arc::new(value), inserted_at: Instant::now() });
    }

    pub fn evict(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            debug!(region = self.name, key, "Evicted cache entry");
        }
    }

    pub fn evict_all(&self) {
        self.entries.clear();
        debug!(region = self.name, "Cleared cache region");
    }

    /// Evict every entry whose key starts with `prefix` (key scan).
    pub fn evict_by_prefix(&self, prefix: &str) {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();
        let evicted = keys.len();
        for key in keys {
            self.entries.remove(&key);
        }
        debug!(region = self.name, prefix, evicted, "Evicted cache entries by prefix");
    }

    /// Evict every entry whose key ends with `suffix` (key scan).
    pub fn evict_by_suffix(&self, suffix: &str) {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.key().ends_with(suffix))
            .map(|e| e.key().clone())
            .collect();
        let evicted = keys.len();
        for key in keys {
            self.entries.remove(&key);
        }
        debug!(region = self.name, suffix, evicted, "Evicted cache entries by suffix");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().inserted_at)
            .map(|e| e.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            debug!(region = self.name, key, "Evicted oldest entry from full region");
        }
    }
}

/// All cache regions used by the service.
#[derive(Debug)]
pub struct CacheManager {
    pub config_content: Region<String>,
    pub commit_history: Region<FileHistory>,
    pub latest_commit: Region<String>,
    pub commit_details: Region<CommitChanges>,
    pub vault_secrets: Region<BTreeMap<String, String>>,
    pub namespaces: Region<Vec<String>>,
    pub directory_listing: Region<Vec<String>>,
    pub namespace_events: Region<NamespaceEvents>,
    pub namespace_notifications: Region<NamespaceNotifications>,
}

impl CacheManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            config_content: Region::new("config-content", ttl),
            commit_history: Region::new("commit-history", ttl),
            latest_commit: Region::new("latest-commit", ttl),
            commit_details: Region::new("commit-details", ttl),
            vault_secrets: Region::new("vault-secrets", ttl),
            namespaces: Region::new("namespaces", ttl),
            directory_listing: Region::new("directory-listing", ttl),
            namespace_events: Region::new("namespace-events", ttl),
            namespace_notifications: Region::new("namespace-notifications", ttl),
        }
    }

    /// A namespace was created: the namespace list and all directory
    /// listings are stale.
    pub fn on_namespace_created(&self) {
        self.namespaces.evict("all");
        self.directory_listing.evict_all();
    }

    /// A config file was created under `namespace`.
    pub fn on_config_created(&self, namespace: &str) {
        self.directory_listing.evict_all();
        self.namespace_events.evict(namespace);
        self.namespace_notifications.evict(namespace);
    }

    /// A config file at `file_path` (within `namespace`) was updated.
    pub fn on_config_updated(&self, file_path: &str, namespace: &str) {
        self.config_content.evict(file_path);
        self.commit_history.evict(file_path);
        self.latest_commit.evict(file_path);
        self.namespace_events.evict(namespace);
        self.namespace_notifications.evict(namespace);
    }

    /// A config file at `file_path` (within `namespace`) was deleted.
    pub fn on_config_deleted(&self, file_path: &str, namespace: &str) {
        self.config_content.evict(file_path);
        self.commit_history.evict(file_path);
        self.latest_commit.evict(file_path);
        self.directory_listing.evict_all();
        self.namespace_events.evict(namespace);
        self.namespace_notifications.evict(namespace);
    }

    /// The vault for `namespace` changed: decrypted secrets and every
    /// cached view derived from them are stale.
    pub fn on_vault_updated(&self, namespace: &str) {
        let path_prefix = format!("{}/", namespace);
        self.vault_secrets.evict(namespace);
        self.config_content.evict_by_prefix(&path_prefix);
        self.commit_history.evict_by_prefix(&path_prefix);
        self.latest_commit.evict_by_prefix(&path_prefix);
        // commit-details keys are `<commitId>_<namespace>`
        self.commit_details.evict_by_suffix(&format!("_{}", namespace));
    }

    /// A namespace was deleted: drop everything keyed under it.
    pub fn on_namespace_deleted(&self, namespace: &str) {
        self.namespaces.evict("all");
        self.directory_listing.evict_all();
        self.on_vault_updated(namespace);
        self.namespace_events.evict(namespace);
        self.namespace_notifications.evict(namespace);
    }
}
