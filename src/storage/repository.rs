//! # Repository Gateway
//!
//! Owns the mapping from namespaces to on-disk Git repositories. Every
//! repository operation runs inside [`RepoGateway::with_repo`], which
//! validates the namespace, holds the namespace mutex for the duration
//! of the closure, and releases both handle and lock on all exit paths.
//! Repository handles are opened per operation and never shared across
//! tasks; serialization within a namespace is total, while distinct
//! namespaces proceed in parallel.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{Local, TimeZone};
use dashmap::DashMap;
use git2::{Commit, ErrorCode, Oid, Repository, Signature};
use tracing::{debug, info, warn};

use crate::errors::{Error, Result};
use crate::storage::CommitRecord;
use crate::validation;

/// Auxiliary directory holding the namespace vault file.
pub const VAULT_DIR: &str = ".vault";

pub struct RepoGateway {
    base_path: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for RepoGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoGateway").field("base_path", &self.base_path).finish()
    }
}

impl RepoGateway {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self { base_path: base_path.into(), locks: DashMap::new() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.base_path.join(namespace)
    }

    /// Run `op` against the namespace repository under the namespace
    /// mutex. The repository handle is dropped before the lock is
    /// released, on success and on error alike.
    pub fn with_repo<T, F>(&self, namespace: &str, op: F) -> Result<T>
    where
        F: FnOnce(&Repository) -> Result<T>,
    {
        validation::validate_namespace(namespace)?;
        let lock = self.lock_for(namespace);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        debug!(namespace, "Executing repository operation");
        let repo = self.open_repository(namespace)?;
        let result = op(&repo);
        if result.is_ok() {
            debug!(namespace, "Repository operation completed");
        }
        result
    }

    /// Create the namespace directory, initialize an empty repository,
    /// and create the vault subdirectory.
    pub fn create_namespace(&self, namespace: &str) -> Result<()> {
        validation::validate_namespace(namespace)?;
        let namespace = namespace.trim();
        let dir = self.namespace_dir(namespace);

        let lock = self.lock_for(namespace);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if dir.exists() {
            return Err(Error::namespace_already_exists(namespace));
        }
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::namespace_creation_failed(namespace, &e.to_string()))?;

        Repository::init(&dir).map_err(|e| Error::git_init_failed(namespace, e.message()))?;

        let vault_dir = dir.join(VAULT_DIR);
        if let Err(e) = std::fs::create_dir_all(&vault_dir) {
            warn!(namespace, error = %e, "Failed to create vault directory");
        }

        info!(namespace, path = %dir.display(), "Created and initialized namespace");
        Ok(())
    }

    /// Recursively delete the namespace directory and its Git state.
    pub fn delete_namespace(&self, namespace: &str) -> Result<()> {
        validation::validate_namespace(namespace)?;
        let namespace = namespace.trim();
        let dir = self.namespace_dir(namespace);

        let lock = self.lock_for(namespace);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if !dir.exists() {
            return Err(Error::namespace_not_found(namespace));
        }
        if !dir.is_dir() {
            return Err(Error::internal(format!("Namespace path is not a directory: {}", namespace)));
        }

        std::fs::remove_dir_all(&dir)
            .map_err(|e| Error::internal(format!("Failed to delete namespace '{}': {}", namespace, e)))?;
        self.locks.remove(namespace);

        info!(namespace, path = %dir.display(), "Deleted namespace");
        Ok(())
    }

    fn lock_for(&self, namespace: &str) -> Arc<Mutex<()>> {
        self.locks.entry(namespace.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    fn open_repository(&self, namespace: &str) -> Result<Repository> {
        let dir = self.namespace_dir(namespace);
        if !dir.is_dir() {
            warn!(namespace, path = %dir.display(), "Namespace directory not found");
            return Err(Error::namespace_not_found(namespace));
        }
        if !dir.join(".git").is_dir() {
            warn!(namespace, "Namespace directory has no Git repository");
            return Err(Error::namespace_not_found(namespace));
        }
        Repository::open(&dir)
            .map_err(|e| Error::git_repository_access_failed(namespace, e.message()))
    }
}

/// The HEAD commit of a repository, or `None` while no commit exists yet.
pub fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>> {
    match repo.head() {
        Ok(reference) => {
            let commit = reference
                .peel_to_commit()
                .map_err(|e| Error::git_operation_failed("HEAD", e.message()))?;
            Ok(Some(commit))
        }
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(Error::git_operation_failed("HEAD", e.message())),
    }
}

/// The blob id of `rel_path` in a commit's tree, if the file exists there.
fn tree_entry_id(commit: &Commit<'_>, rel_path: &Path) -> Option<Oid> {
    commit.tree().ok()?.get_path(rel_path).ok().map(|entry| entry.id())
}

/// Whether a commit changed the file at `rel_path` relative to its first
/// parent. History is linear under the single-writer rule, so only the
/// first parent matters.
fn commit_touches(commit: &Commit<'_>, rel_path: &Path) -> bool {
    let current = tree_entry_id(commit, rel_path);
    match commit.parent(0) {
        Ok(parent) => current != tree_entry_id(&parent, rel_path),
        Err(_) => current.is_some(),
    }
}

/// The most recent commit id that touched `rel_path`, walking from HEAD.
pub fn latest_commit_touching(repo: &Repository, rel_path: &str) -> Result<Option<String>> {
    let commits = commits_touching(repo, rel_path, 1)?;
    Ok(commits.into_iter().next().map(|record| record.commit_id))
}

/// Up to `limit` most recent commits that touched `rel_path`.
pub fn commits_touching(repo: &Repository, rel_path: &str, limit: usize) -> Result<Vec<CommitRecord>> {
    let path = Path::new(rel_path);
    let mut records = Vec::new();

    if head_commit(repo)?.is_none() {
        return Ok(records);
    }

    let mut walk = repo.revwalk().map_err(|e| Error::git_log_failed(rel_path, e.message()))?;
    walk.push_head().map_err(|e| Error::git_log_failed(rel_path, e.message()))?;

    for oid in walk {
        let oid = oid.map_err(|e| Error::git_log_failed(rel_path, e.message()))?;
        let commit =
            repo.find_commit(oid).map_err(|e| Error::git_log_failed(rel_path, e.message()))?;
        if commit_touches(&commit, path) {
            records.push(format_commit(&commit));
            if records.len() >= limit {
                break;
            }
        }
    }
    Ok(records)
}

/// Up to `limit` most recent commits on the default branch.
pub fn recent_commits(repo: &Repository, limit: usize) -> Result<Vec<CommitRecord>> {
    let mut records = Vec::new();
    if head_commit(repo)?.is_none() {
        return Ok(records);
    }

    let mut walk = repo.revwalk().map_err(|e| Error::git_log_failed("HEAD", e.message()))?;
    walk.push_head().map_err(|e| Error::git_log_failed("HEAD", e.message()))?;

    for oid in walk.take(limit) {
        let oid = oid.map_err(|e| Error::git_log_failed("HEAD", e.message()))?;
        let commit = repo.find_commit(oid).map_err(|e| Error::git_log_failed("HEAD", e.message()))?;
        records.push(format_commit(&commit));
    }
    Ok(records)
}

/// Stage a single path (add or removal) and commit it against HEAD.
/// Returns the new commit id.
pub fn stage_and_commit(
    repo: &Repository,
    rel_path: &str,
    message: &str,
    email: &str,
    removal: bool,
) -> Result<String> {
    let signature = author_signature(email)?;

    let mut index =
        repo.index().map_err(|e| Error::git_commit_failed(rel_path, e.message()))?;
    if removal {
        index
            .remove_path(Path::new(rel_path))
            .map_err(|e| Error::git_commit_failed(rel_path, e.message()))?;
    } else {
        index
            .add_path(Path::new(rel_path))
            .map_err(|e| Error::git_commit_failed(rel_path, e.message()))?;
    }
    index.write().map_err(|e| Error::git_commit_failed(rel_path, e.message()))?;

    let tree_id = index.write_tree().map_err(|e| Error::git_commit_failed(rel_path, e.message()))?;
    let tree = repo.find_tree(tree_id).map_err(|e| Error::git_commit_failed(rel_path, e.message()))?;

    let parent = head_commit(repo)?;
    let parents: Vec<&Commit<'_>> = parent.iter().collect();
    let oid = repo
        .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .map_err(|e| Error::git_commit_failed(rel_path, e.message()))?;

    Ok(oid.to_string())
}

/// Commit author convention: name is the local part of the email.
fn author_signature(email: &str) -> Result<Signature<'static>> {
    let name = email.split('@').next().unwrap_or(email);
    Signature::now(name, email)
        .map_err(|e| Error::git_commit_failed(email, e.message()))
}

/// Format commit metadata the way the API returns it.
pub fn format_commit(commit: &Commit<'_>) -> CommitRecord {
    let author = commit.author();
    let date = Local
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    CommitRecord {
        commit_id: commit.id().to_string(),
        author: author.name().unwrap_or_default().to_string(),
        email: author.email().unwrap_or_default().to_string(),
        date,
        commit_message: Some(commit.summary().unwrap_or_default().to_string()),
    }
}
