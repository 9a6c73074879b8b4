//! # Secret Processor
//!
//! Two-mode transformation over YAML configuration using the namespace
//! vault. Client mode substitutes decrypted secrets into matching
//! leaves for pull clients; internal mode redacts those leaves with the
//! `<ENCRYPTED_VALUE>` placeholder for management and audit surfaces.
//! Both modes share one recursive walk and are best-effort: any failure
//! returns the input text unchanged.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_yaml::{Mapping, Value};
use tracing::{debug, error, warn};

use crate::errors::Result;
use crate::storage::VaultStore;
use crate::yamlops;

/// Placeholder written in place of vaulted leaves on internal surfaces.
/// Out-of-band sentinel; it must never be returned to pull clients.
pub const ENCRYPTED_PLACEHOLDER: &str = "<ENCRYPTED_VALUE>";

#[derive(Debug)]
pub struct SecretProcessor {
    vault: Arc<VaultStore>,
}

impl SecretProcessor {
    pub fn new(vault: Arc<VaultStore>) -> Self {
        Self { vault }
    }

    /// Substitute decrypted vault values into leaves whose dotted path
    /// matches a vault key. For pull clients only.
    pub fn process_for_client(&self, content: &str, namespace: &str) -> String {
        match self.transform(content, namespace, resolve_leaf) {
            Ok(processed) => processed,
            Err(e) => {
                error!(namespace, error = %e, "Failed to process configuration for client");
                content.to_string()
            }
        }
    }

    /// Redact leaves whose dotted path matches a vault key with
    /// [`ENCRYPTED_PLACEHOLDER`]. For management and audit surfaces.
    pub fn process_for_internal(&self, content: &str, namespace: &str) -> String {
        match self.transform(content, namespace, redact_leaf) {
            Ok(processed) => processed,
            Err(e) => {
                error!(namespace, error = %e, "Failed to process configuration for internal use");
                content.to_string()
            }
        }
    }

    fn transform(
        &self,
        content: &str,
        namespace: &str,
        leaf_op: fn(&str, &mut Value, &BTreeMap<String, String>),
    ) -> Result<String> {
        let vault = self.vault.get_vault(namespace)?;
        if vault.is_empty() {
            return Ok(content.to_string());
        }

        let mut mapping = yamlops::parse(content)?;
        if mapping.is_empty() {
            return Ok(content.to_string());
        }

        walk(&mut mapping, "", &mut |path, value| leaf_op(path, value, vault.as_ref()));
        yamlops::dump(&mapping)
    }
}

/// Recursive traversal shared by both modes: descend through mappings,
/// apply the leaf operation to everything else.
fn walk(mapping: &mut Mapping, prefix: &str, leaf_op: &mut impl FnMut(&str, &mut Value)) {
    for (key, value) in mapping.iter_mut() {
        let key_text = match key {
            Value::String(s) => s.clone(),
            other => serde_yaml::to_string(other).unwrap_or_default().trim_end().to_string(),
        };
        let path =
            if prefix.is_empty() { key_text } else { format!("{}.{}", prefix, key_text) };

        match value {
            Value::Mapping(nested) => walk(nested, &path, leaf_op),
            leaf => leaf_op(&path, leaf),
        }
    }
}

fn resolve_leaf(path: &str, value: &mut Value, vault: &BTreeMap<String, String>) {
    if let Some(secret) = vault.get(path) {
        *value = Value::String(secret.clone());
        debug!(key = path, "Substituted vault secret for client");
    } else if value.as_str() == Some(ENCRYPTED_PLACEHOLDER) {
        warn!(key = path, "Found {} placeholder but no matching vault secret", ENCRYPTED_PLACEHOLDER);
    }
}

fn redact_leaf(path: &str, value: &mut Value, vault: &BTreeMap<String, String>) {
    if vault.contains_key(path) {
        *value = Value::String(ENCRYPTED_PLACEHOLDER.to_string());
        debug!(key = path, "Redacted vault-backed leaf");
    }
}
