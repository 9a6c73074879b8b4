//! # Configuration Resolver
//!
//! Implements the pull-client contract: merge the namespace-wide base,
//! the application base, and profile overlays in precedence order,
//! flatten to dot notation, substitute vault secrets, and return a
//! single merged property source versioned by the application file's
//! latest commit.

use std::sync::Arc;

use serde::Serialize;
use serde_yaml::Mapping;
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::secrets::SecretProcessor;
use crate::storage::{file_path_for, ConfigStore};
use crate::validation;
use crate::yamlops;

/// Namespace assumed when the label is missing or empty.
const DEFAULT_NAMESPACE: &str = "main";

/// One named group of resolved properties.
#[derive(Debug, Clone, Serialize)]
pub struct PropertySource {
    pub name: String,
    pub source: Mapping,
}

/// The full resolution result returned to pull clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub name: String,
    pub profiles: Vec<String>,
    pub label: Option<String>,
    pub version: Option<String>,
    pub property_sources: Vec<PropertySource>,
}

#[derive(Debug)]
pub struct Resolver {
    store: Arc<ConfigStore>,
    secrets: Arc<SecretProcessor>,
}

impl Resolver {
    pub fn new(store: Arc<ConfigStore>, secrets: Arc<SecretProcessor>) -> Self {
        Self { store, secrets }
    }

    /// Resolve `(application, profile, label)` into a merged property
    /// view. `label` has the shape `<namespace>[/<subpath>]`; missing
    /// sources are skipped, but at least one must load.
    pub fn resolve(&self, application: &str, profile: &str, label: &str) -> Result<ResolvedConfig> {
        info!(application, profile, label, "Resolving configuration");
        validation::validate_config_request(application, profile, label)?;

        let namespace = namespace_from_label(label);
        validation::validate_namespace(&namespace)?;
        let sub_path = sub_path_from_label(label);

        let mut sources: Vec<Mapping> = Vec::new();

        // Shared base, application base, then profile overlays in order.
        self.load_source(&mut sources, &namespace, &sub_path, "application", None);
        self.load_source(&mut sources, &namespace, &sub_path, application, None);
        for single in profile.split(',') {
            let trimmed = single.trim();
            if !trimmed.is_empty() && trimmed != "default" {
                self.load_source(&mut sources, &namespace, &sub_path, application, Some(trimmed));
            }
        }

        let main_file_path = file_path_for(&namespace, &sub_path, application, None);
        if sources.is_empty() {
            return Err(Error::config_file_not_found(&main_file_path));
        }
        let source_count = sources.len();

        let flattened = yamlops::merge_and_flatten(sources);
        let flattened_yaml = yamlops::dump(&flattened)?;
        let resolved_yaml = self.secrets.process_for_client(&flattened_yaml, &namespace);
        let properties = yamlops::parse(&resolved_yaml)?;

        let version = self.store.latest_commit_id(&main_file_path)?;

        let profile_label = if profile.trim().is_empty() { "default" } else { profile.trim() };
        let source_name = format!("merged-{}-{}", application, profile_label);

        info!(
            application,
            version,
            sources = source_count,
            properties = properties.len(),
            "Resolved configuration"
        );

        Ok(ResolvedConfig {
            name: application.to_string(),
            profiles: profile_label.split(',').map(|p| p.trim().to_string()).collect(),
            label: if label.trim().is_empty() { None } else { Some(label.to_string()) },
            version: Some(version),
            property_sources: vec![PropertySource { name: source_name, source: properties }],
        })
    }

    /// Load one optional source file; anything that fails to load or
    /// parse is skipped (best-effort read path).
    fn load_source(
        &self,
        sources: &mut Vec<Mapping>,
        namespace: &str,
        sub_path: &str,
        application: &str,
        profile: Option<&str>,
    ) {
        let file_path = file_path_for(namespace, sub_path, application, profile);
        match self.store.read(&file_path) {
            Ok(content) => match yamlops::parse(&content) {
                Ok(mapping) if !mapping.is_empty() => {
                    debug!(file_path, "Loaded raw properties");
                    sources.push(mapping);
                }
                Ok(_) => debug!(file_path, "Skipping empty configuration source"),
                Err(e) => debug!(file_path, error = %e, "Skipping malformed configuration source"),
            },
            Err(e) => {
                debug!(file_path, error = %e, "Configuration file not found or could not be loaded");
            }
        }
    }
}

/// `"production/config"` → `"production"`; empty → `"main"`.
fn namespace_from_label(label: &str) -> String {
    let clean = label.trim();
    if clean.is_empty() {
        return DEFAULT_NAMESPACE.to_string();
    }
    match clean.find('/') {
        Some(index) => clean[..index].to_string(),
        None => clean.to_string(),
    }
}

/// `"production/config/api"` → `"config/api"`; no subpath → `""`.
fn sub_path_from_label(label: &str) -> String {
    let clean = label.trim();
    match clean.find('/') {
        Some(index) => clean[index + 1..].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_from_label() {
        assert_eq!(namespace_from_label("production/config"), "production");
        assert_eq!(namespace_from_label("production"), "production");
        assert_eq!(namespace_from_label("test/api/v1"), "test");
        assert_eq!(namespace_from_label(""), "main");
        assert_eq!(namespace_from_label("  "), "main");
    }

    #[test]
    fn test_sub_path_from_label() {
        assert_eq!(sub_path_from_label("production/config"), "config");
        assert_eq!(sub_path_from_label("test/api/v1"), "api/v1");
        assert_eq!(sub_path_from_label("production"), "");
        assert_eq!(sub_path_from_label(""), "");
    }
}
