//! # Configuration Store
//!
//! File-level CRUD on namespace configuration files, backed by the
//! repository gateway. Writes commit exactly once, invalidate the cache
//! before returning, and enqueue a refresh notification. Reads are
//! served through the internal-mode secret view so plaintext secrets
//! never reach management surfaces.

use std::path::Path;
use std::sync::Arc;

use git2::Repository;
use tracing::{debug, info};

use crate::cache::CacheManager;
use crate::errors::{Error, Result};
use crate::notify::{NamespaceNotifications, Notifier, NotifyStore};
use crate::secrets::SecretProcessor;
use crate::storage::repository::{
    commits_touching, head_commit, latest_commit_touching, recent_commits, stage_and_commit,
    RepoGateway,
};
use crate::storage::{
    namespace_of, relative_path_within_namespace, CommitChanges, CommitRecord, FileHistory,
    NamespaceEvents,
};
use crate::validation;

/// Template written when a configuration file is first created; the
/// `<app-name>` marker is replaced with the application name.
const DEFAULT_CONFIG_TEMPLATE: &str = "server:\n  port: 8080\n\napplication:\n  name: <app-name>\n";

/// Content and metadata for a configuration file update.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub app_name: String,
    pub content: String,
    pub message: String,
    pub email: String,
    pub expected_commit_id: String,
}

/// Metadata for a configuration file deletion.
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub message: String,
    pub email: String,
}

#[derive(Debug)]
pub struct ConfigStore {
    gateway: Arc<RepoGateway>,
    secrets: Arc<SecretProcessor>,
    cache: Arc<CacheManager>,
    notifier: Arc<Notifier>,
    notify_store: Arc<NotifyStore>,
    commit_history_size: usize,
}

impl ConfigStore {
    pub fn new(
        gateway: Arc<RepoGateway>,
        secrets: Arc<SecretProcessor>,
        cache: Arc<CacheManager>,
        notifier: Arc<Notifier>,
        notify_store: Arc<NotifyStore>,
        commit_history_size: usize,
    ) -> Self {
        Self { gateway, secrets, cache, notifier, notify_store, commit_history_size }
    }

    /// Create a new namespace: directory, empty repository, vault dir.
    pub fn create_namespace(&self, namespace: &str) -> Result<()> {
        self.gateway.create_namespace(namespace)?;
        self.cache.on_namespace_created();
        Ok(())
    }

    /// Recursively delete a namespace and drop every cache entry keyed
    /// under it.
    pub fn delete_namespace(&self, namespace: &str) -> Result<()> {
        self.gateway.delete_namespace(namespace)?;
        self.cache.on_namespace_deleted(namespace.trim());
        Ok(())
    }

    /// Create a configuration file from the default template and commit it.
    pub fn initialize(&self, file_path: &str, app_name: &str, email: &str) -> Result<()> {
        validation::validate_safe_path(file_path)?;
        validation::validate_app_name(app_name)?;

        let namespace = namespace_of(file_path);
        let relative = relative_path_within_namespace(file_path);

        self.gateway.with_repo(&namespace, |repo| {
            let full_path = work_file(repo, &relative)?;
            if full_path.exists() {
                return Err(Error::config_file_already_exists(file_path));
            }
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::config_file_creation_failed(file_path, &e.to_string()))?;
            }

            let content = DEFAULT_CONFIG_TEMPLATE.replace("<app-name>", app_name.trim());
            std::fs::write(&full_path, content)
                .map_err(|e| Error::config_file_creation_failed(file_path, &e.to_string()))?;

            let message = format!("First commit ApplicationName - {}", app_name.trim());
            stage_and_commit(repo, &relative, &message, email, false)?;

            info!(file = %full_path.display(), "Created configuration file");
            Ok(())
        })?;

        self.cache.on_config_created(&namespace);
        Ok(())
    }

    /// Update a configuration file under the optimistic-concurrency
    /// check and return the new commit id.
    pub fn update(&self, file_path: &str, request: &UpdateRequest) -> Result<String> {
        validation::validate_safe_path(file_path)?;
        validation::validate_yaml_content(&request.content)?;
        validation::validate_commit_message(&request.message)?;
        validation::validate_commit_id(&request.expected_commit_id)?;

        let namespace = namespace_of(file_path);
        let relative = relative_path_within_namespace(file_path);

        // Redact vault-backed leaves before the content reaches Git so the
        // repository never stores plaintext secrets. Runs outside the
        // namespace lock because it reads the vault through the gateway.
        let processed = self.secrets.process_for_internal(&request.content, &namespace);

        let commit_id = self.gateway.with_repo(&namespace, |repo| {
            if head_commit(repo)?.is_none() {
                return Err(Error::config_file_not_found(format!(
                    "No commits found in repository for file: {}",
                    file_path
                )));
            }

            let current = latest_commit_touching(repo, &relative)?;
            if current.as_deref() != Some(request.expected_commit_id.trim()) {
                return Err(Error::conflict_detected(&request.app_name));
            }

            let full_path = work_file(repo, &relative)?;
            if !full_path.exists() {
                return Err(Error::config_file_not_found(file_path));
            }

            std::fs::write(&full_path, &processed)
                .map_err(|e| Error::config_file_update_failed(file_path, &e.to_string()))?;
            let commit_id =
                stage_and_commit(repo, &relative, &request.message, &request.email, false)?;

            info!(file = %full_path.display(), message = %request.message, "Updated configuration file");
            Ok(commit_id)
        })?;

        self.cache.on_config_updated(file_path, &namespace);
        self.notifier.send_refresh(&namespace, &request.app_name, Some(&commit_id));
        Ok(commit_id)
    }

    /// Current content of a configuration file through the internal-mode
    /// secret view. Cached under `config-content[file_path]`.
    pub fn read(&self, file_path: &str) -> Result<String> {
        validation::validate_safe_path(file_path)?;

        if let Some(cached) = self.cache.config_content.get(file_path) {
            return Ok((*cached).clone());
        }

        let namespace = namespace_of(file_path);
        let relative = relative_path_within_namespace(file_path);

        let raw = self.gateway.with_repo(&namespace, |repo| {
            let full_path = work_file(repo, &relative)?;
            if !full_path.exists() {
                return Err(Error::config_file_not_found(file_path));
            }
            std::fs::read_to_string(&full_path)
                .map_err(|e| Error::config_file_read_failed(file_path, &e.to_string()))
        })?;

        let processed = self.secrets.process_for_internal(&raw, &namespace);
        self.cache.config_content.put(file_path, processed.clone());
        Ok(processed)
    }

    /// Id of the most recent commit touching the file. Cached under
    /// `latest-commit[file_path]`.
    pub fn latest_commit_id(&self, file_path: &str) -> Result<String> {
        validation::validate_safe_path(file_path)?;

        if let Some(cached) = self.cache.latest_commit.get(file_path) {
            return Ok((*cached).clone());
        }

        let namespace = namespace_of(file_path);
        let relative = relative_path_within_namespace(file_path);

        let commit_id = self.gateway.with_repo(&namespace, |repo| {
            if head_commit(repo)?.is_none() {
                return Err(Error::config_file_not_found(format!(
                    "No commits found in repository for file: {}",
                    file_path
                )));
            }
            latest_commit_touching(repo, &relative)?
                .ok_or_else(|| Error::config_file_not_found(file_path))
        })?;

        self.cache.latest_commit.put(file_path, commit_id.clone());
        Ok(commit_id)
    }

    /// Commit history of the file, newest first, bounded by the
    /// configured history size. Cached under `commit-history[file_path]`.
    pub fn history(&self, file_path: &str) -> Result<FileHistory> {
        validation::validate_safe_path(file_path)?;

        if let Some(cached) = self.cache.commit_history.get(file_path) {
            return Ok((*cached).clone());
        }

        let namespace = namespace_of(file_path);
        let relative = relative_path_within_namespace(file_path);

        let commits: Vec<CommitRecord> = self
            .gateway
            .with_repo(&namespace, |repo| commits_touching(repo, &relative, self.commit_history_size))?;

        let history = FileHistory { file_path: file_path.to_string(), commits };
        self.cache.commit_history.put(file_path, history.clone());
        Ok(history)
    }

    /// Delete a configuration file via a removal commit.
    pub fn delete(&self, file_path: &str, request: &DeleteRequest) -> Result<()> {
        validation::validate_safe_path(file_path)?;
        validation::validate_commit_message(&request.message)?;

        let namespace = namespace_of(file_path);
        let relative = relative_path_within_namespace(file_path);

        self.gateway.with_repo(&namespace, |repo| {
            let full_path = work_file(repo, &relative)?;
            if !full_path.exists() {
                return Err(Error::config_file_not_found(file_path));
            }
            std::fs::remove_file(&full_path)
                .map_err(|e| Error::config_file_update_failed(file_path, &e.to_string()))?;
            stage_and_commit(repo, &relative, &request.message, &request.email, true)?;

            info!(file = %file_path, message = %request.message, "Committed configuration file deletion");
            Ok(())
        })?;

        self.cache.on_config_deleted(file_path, &namespace);
        Ok(())
    }

    /// Metadata plus cleaned unified diff for one commit. A root commit
    /// diffs against the empty tree. Cached under
    /// `commit-details[<commitId>_<namespace>]`.
    pub fn commit_changes(&self, commit_id: &str, namespace: &str) -> Result<CommitChanges> {
        validation::validate_commit_id(commit_id)?;
        validation::validate_namespace(namespace)?;

        let cache_key = format!("{}_{}", commit_id.trim(), namespace);
        if let Some(cached) = self.cache.commit_details.get(&cache_key) {
            return Ok((*cached).clone());
        }

        let changes = self.gateway.with_repo(namespace, |repo| {
            let commit = repo
                .revparse_single(commit_id.trim())
                .and_then(|object| object.peel_to_commit())
                .map_err(|e| Error::git_diff_failed(commit_id, e.message()))?;

            let tree =
                commit.tree().map_err(|e| Error::git_diff_failed(commit_id, e.message()))?;
            let parent_tree = match commit.parent(0) {
                Ok(parent) => {
                    Some(parent.tree().map_err(|e| Error::git_diff_failed(commit_id, e.message()))?)
                }
                Err(_) => None,
            };

            let diff = repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
                .map_err(|e| Error::git_diff_failed(commit_id, e.message()))?;

            let mut patch = String::new();
            diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
                match line.origin() {
                    '+' | '-' | ' ' => patch.push(line.origin()),
                    _ => {}
                }
                patch.push_str(std::str::from_utf8(line.content()).unwrap_or(""));
                true
            })
            .map_err(|e| Error::git_diff_failed(commit_id, e.message()))?;

            let record = crate::storage::repository::format_commit(&commit);
            Ok(CommitChanges {
                commit_id: commit.id().to_string(),
                commit_message: commit.message().unwrap_or_default().to_string(),
                author: record.author,
                commit_time: record.date,
                changes: filter_diff_metadata(&patch),
            })
        })?;

        self.cache.commit_details.put(cache_key, changes.clone());
        Ok(changes)
    }

    /// Recent commits across the whole namespace; an empty repository
    /// yields an empty list. Cached under `namespace-events[namespace]`.
    pub fn namespace_events(&self, namespace: &str) -> Result<NamespaceEvents> {
        validation::validate_namespace(namespace)?;
        let namespace = namespace.trim();

        if let Some(cached) = self.cache.namespace_events.get(namespace) {
            return Ok((*cached).clone());
        }

        let commits = self
            .gateway
            .with_repo(namespace, |repo| recent_commits(repo, self.commit_history_size))?;

        let events = NamespaceEvents {
            namespace: namespace.to_string(),
            total_commits: commits.len(),
            commits,
        };
        self.cache.namespace_events.put(namespace, events.clone());
        Ok(events)
    }

    /// Recent refresh notifications for a namespace. Only non-empty
    /// results are cached so an idle namespace is not pinned for a TTL.
    pub fn namespace_notifications(&self, namespace: &str) -> Result<NamespaceNotifications> {
        validation::validate_namespace(namespace)?;
        let namespace = namespace.trim();

        if !self.namespace_exists(namespace) {
            return Err(Error::namespace_not_found(namespace));
        }

        if let Some(cached) = self.cache.namespace_notifications.get(namespace) {
            return Ok((*cached).clone());
        }

        let notifications = self.notify_store.recent(namespace, self.commit_history_size);
        let view = NamespaceNotifications {
            namespace: namespace.to_string(),
            total_notifications: notifications.len(),
            max_notifications: self.commit_history_size,
            notifications,
        };

        if view.total_notifications > 0 {
            self.cache.namespace_notifications.put(namespace, view.clone());
        }
        Ok(view)
    }

    /// Names within a namespace directory: `.yml` files with the suffix
    /// stripped and subdirectories with a `/` appended, sorted
    /// case-insensitively. Hidden entries are skipped.
    pub fn list_directory(&self, namespace: &str, path: &str) -> Result<Vec<String>> {
        validation::validate_namespace(namespace)?;
        let namespace = namespace.trim();

        let clean_path = path.trim().trim_start_matches('/').to_string();
        if !clean_path.is_empty() {
            validation::validate_safe_path(&clean_path)?;
        }

        let cache_key = format!("{}_{}", namespace, clean_path);
        if let Some(cached) = self.cache.directory_listing.get(&cache_key) {
            return Ok((*cached).clone());
        }

        let namespace_dir = self.gateway.namespace_dir(namespace);
        if !namespace_dir.is_dir() {
            return Err(Error::namespace_not_found(namespace));
        }

        let target = if clean_path.is_empty() {
            namespace_dir.clone()
        } else {
            namespace_dir.join(&clean_path)
        };
        if !target.is_dir() {
            return Err(Error::config_file_not_found(format!("{}/{}", namespace, clean_path)));
        }

        // Defense in depth on top of the traversal validation above.
        let canonical_target = target
            .canonicalize()
            .map_err(|e| Error::internal(format!("Failed to resolve directory: {}", e)))?;
        let canonical_namespace = namespace_dir
            .canonicalize()
            .map_err(|e| Error::internal(format!("Failed to resolve namespace dir: {}", e)))?;
        if !canonical_target.starts_with(&canonical_namespace) {
            return Err(Error::invalid_path(path, "Access denied"));
        }

        let mut names = Vec::new();
        let entries = std::fs::read_dir(&target)
            .map_err(|e| Error::internal(format!("Failed to list directory: {}", e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::internal(format!("Failed to read entry: {}", e)))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let file_type =
                entry.file_type().map_err(|e| Error::internal(format!("Failed to stat entry: {}", e)))?;
            if file_type.is_dir() {
                names.push(format!("{}/", name));
            } else if name.to_lowercase().ends_with(".yml") {
                names.push(name.split('.').next().unwrap_or(&name).to_string());
            }
        }
        names.sort_by_key(|name| name.to_lowercase());

        debug!(namespace, path = %clean_path, entries = names.len(), "Listed directory contents");
        self.cache.directory_listing.put(cache_key, names.clone());
        Ok(names)
    }

    /// Names of valid namespaces under the base path: directories that
    /// pass namespace validation and contain a Git repository. Cached
    /// under `namespaces["all"]`.
    pub fn list_namespaces(&self) -> Result<Vec<String>> {
        if let Some(cached) = self.cache.namespaces.get("all") {
            return Ok((*cached).clone());
        }

        let base = self.gateway.base_path();
        if !base.is_dir() {
            debug!(base = %base.display(), "Base directory does not exist");
            return Ok(Vec::new());
        }

        let mut namespaces = Vec::new();
        let entries = std::fs::read_dir(base)
            .map_err(|e| Error::internal(format!("Failed to list base directory: {}", e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::internal(format!("Failed to read entry: {}", e)))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if validation::validate_namespace(&name).is_ok() && self.namespace_exists(&name) {
                namespaces.push(name);
            }
        }
        namespaces.sort();

        self.cache.namespaces.put("all", namespaces.clone());
        Ok(namespaces)
    }

    fn namespace_exists(&self, namespace: &str) -> bool {
        self.gateway.namespace_dir(namespace).join(".git").is_dir()
    }
}

/// Resolve a relative path inside the repository work tree.
fn work_file(repo: &Repository, relative: &str) -> Result<std::path::PathBuf> {
    let work_tree: &Path = repo
        .workdir()
        .ok_or_else(|| Error::internal("Repository has no work tree"))?;
    Ok(work_tree.join(relative))
}

/// Strip Git metadata header lines from a diff while preserving hunk
/// headers and content. The filter matches line prefixes, so content
/// lines that themselves begin with one of these prefixes inside YAML
/// values are also removed; callers accept that limitation.
fn filter_diff_metadata(raw_diff: &str) -> String {
    const METADATA_PREFIXES: [&str; 11] = [
        "diff --git",
        "index ",
        "--- ",
        "+++ ",
        "new file mode",
        "deleted file mode",
        "similarity index",
        "rename from",
        "rename to",
        "copy from",
        "copy to",
    ];

    if raw_diff.trim().is_empty() {
        return raw_diff.trim().to_string();
    }

    raw_diff
        .lines()
        .filter(|line| !METADATA_PREFIXES.iter().any(|prefix| line.starts_with(prefix)))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
