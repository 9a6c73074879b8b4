//! # Storage
//!
//! Git-backed persistence for namespaces, configuration files, and the
//! per-namespace secret vault. All mutation funnels through
//! [`RepoGateway`], which serializes access per namespace.

pub mod config_store;
pub mod repository;
pub mod vault_store;

pub use config_store::ConfigStore;
pub use repository::RepoGateway;
pub use vault_store::VaultStore;

use serde::{Deserialize, Serialize};

/// Structured form of a Git commit returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub commit_id: String,
    pub author: String,
    pub email: String,
    /// `YYYY-MM-DD HH:MM:SS` in the server's local zone
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
}

/// Commit history of a single configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHistory {
    pub file_path: String,
    pub commits: Vec<CommitRecord>,
}

/// Metadata and cleaned diff of a single commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitChanges {
    pub commit_id: String,
    pub commit_message: String,
    pub author: String,
    pub commit_time: String,
    pub changes: String,
}

/// Recent commit activity across a namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceEvents {
    pub namespace: String,
    pub commits: Vec<CommitRecord>,
    pub total_commits: usize,
}

/// Extract the namespace component of a full file path.
/// `"prod/config/app.yml"` → `"prod"`.
pub fn namespace_of(file_path: &str) -> String {
    let clean = file_path.strip_prefix('/').unwrap_or(file_path);
    match clean.find('/') {
        Some(index) => clean[..index].to_string(),
        None => clean.to_string(),
    }
}

/// Extract the path relative to the namespace directory.
/// `"prod/config/app.yml"` → `"config/app.yml"`; a bare namespace yields `""`.
pub fn relative_path_within_namespace(file_path: &str) -> String {
    let clean = file_path.strip_prefix('/').unwrap_or(file_path);
    match clean.find('/') {
        Some(index) => clean[index + 1..].to_string(),
        None => String::new(),
    }
}

/// Build the full file path for an application config within a namespace.
/// The `default` profile maps to the profile-less base file.
pub fn file_path_for(
    namespace: &str,
    sub_path: &str,
    application: &str,
    profile: Option<&str>,
) -> String {
    let mut path = String::from(namespace);
    if !sub_path.is_empty() {
        path.push('/');
        path.push_str(sub_path);
    }
    path.push('/');
    path.push_str(application);
    if let Some(profile) = profile.map(str::trim).filter(|p| !p.is_empty() && *p != "default") {
        path.push('-');
        path.push_str(profile);
    }
    path.push_str(".yml");
    path
}
