//! # Vault Store
//!
//! Loads and persists the per-namespace secret map stored at
//! `.vault/<namespace>-vault.json`. Values are encrypted at rest with
//! the process cipher; a vault write always replaces the whole map and
//! produces one commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::CacheManager;
use crate::crypto::Cipher;
use crate::errors::{Error, Result};
use crate::storage::repository::{stage_and_commit, RepoGateway, VAULT_DIR};
use crate::validation;

const VAULT_FILE_SUFFIX: &str = "-vault.json";

#[derive(Debug)]
pub struct VaultStore {
    gateway: Arc<RepoGateway>,
    cipher: Arc<Cipher>,
    cache: Arc<CacheManager>,
}

impl VaultStore {
    pub fn new(gateway: Arc<RepoGateway>, cipher: Arc<Cipher>, cache: Arc<CacheManager>) -> Self {
        Self { gateway, cipher, cache }
    }

    /// The decrypted secret map for a namespace; an absent vault file is
    /// an empty map. Cached under `vault-secrets[namespace]`.
    pub fn get_vault(&self, namespace: &str) -> Result<Arc<BTreeMap<String, String>>> {
        validation::validate_namespace(namespace)?;

        if let Some(cached) = self.cache.vault_secrets.get(namespace) {
            return Ok(cached);
        }

        let secrets = self.gateway.with_repo(namespace, |repo| {
            let mut map = load_vault_file(repo, namespace)?;
            for value in map.values_mut() {
                *value = self.cipher.decrypt(value)?;
            }
            Ok(map)
        })?;

        let snapshot = Arc::new(secrets);
        self.cache.vault_secrets.put(namespace, (*snapshot).clone());
        Ok(snapshot)
    }

    /// Replace the namespace secret map. Keys absent from `secrets` are
    /// removed; an empty map erases the vault. Every write is committed
    /// and invalidates the caches derived from the vault.
    pub fn update_vault(
        &self,
        namespace: &str,
        secrets: &BTreeMap<String, String>,
        email: &str,
        commit_message: &str,
    ) -> Result<()> {
        validation::validate_namespace(namespace)?;
        validation::validate_commit_message(commit_message)?;
        validation::validate_email(email)?;
        for key in secrets.keys() {
            validation::validate_secret_key(key)?;
        }

        let mut encrypted = BTreeMap::new();
        for (key, value) in secrets {
            encrypted.insert(key.clone(), self.cipher.encrypt(value)?);
        }

        self.gateway.with_repo(namespace, |repo| {
            save_vault_file(repo, namespace, &encrypted)?;
            stage_and_commit(repo, &vault_rel_path(namespace), commit_message, email, false)?;
            Ok(())
        })?;

        self.cache.on_vault_updated(namespace);
        info!(namespace, secret_count = secrets.len(), "Updated namespace vault");
        Ok(())
    }
}

fn vault_rel_path(namespace: &str) -> String {
    format!("{}/{}{}", VAULT_DIR, namespace, VAULT_FILE_SUFFIX)
}

fn load_vault_file(repo: &git2::Repository, namespace: &str) -> Result<BTreeMap<String, String>> {
    let work_tree = repo
        .workdir()
        .ok_or_else(|| Error::vault_operation_failed("Repository has no work tree"))?;
    let vault_path = work_tree.join(vault_rel_path(namespace));

    if !vault_path.exists() {
        debug!(namespace, "Vault file does not exist, returning empty map");
        return Ok(BTreeMap::new());
    }

    let json = std::fs::read_to_string(&vault_path)
        .map_err(|e| Error::vault_operation_failed(format!("Failed to read vault file: {}", e)))?;
    if json.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(&json)
        .map_err(|e| Error::vault_operation_failed(format!("Failed to parse vault file: {}", e)))
}

fn save_vault_file(
    repo: &git2::Repository,
    namespace: &str,
    secrets: &BTreeMap<String, String>,
) -> Result<()> {
    let work_tree = repo
        .workdir()
        .ok_or_else(|| Error::vault_operation_failed("Repository has no work tree"))?;
    let vault_path = work_tree.join(vault_rel_path(namespace));

    if let Some(parent) = vault_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::vault_operation_failed(format!("Failed to create vault directory: {}", e))
        })?;
    }

    let json = serde_json::to_string_pretty(secrets)
        .map_err(|e| Error::vault_operation_failed(format!("Failed to serialize vault: {}", e)))?;
    std::fs::write(&vault_path, json)
        .map_err(|e| Error::vault_operation_failed(format!("Failed to save vault file: {}", e)))
}
