//! # Input Validation
//!
//! Pure validation helpers invoked at every external boundary before
//! any filesystem or Git operation. Each failure carries a stable
//! machine-readable code.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::errors::{Error, Result};

lazy_static! {
    static ref SAFE_PATH_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9/_.-]+$").expect("valid path regex");
    static ref SAFE_NAME_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9_-]*[a-zA-Z0-9])?$").expect("valid name regex");
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9+_.-]+@([A-Za-z0-9.-]+\.[A-Za-z]{2,})$").expect("valid email regex");
    static ref COMMIT_ID_REGEX: Regex = Regex::new(r"^[a-fA-F0-9]{7,64}$").expect("valid commit regex");
    static ref SECRET_KEY_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9._-]+$").expect("valid key regex");
    static ref SECRET_SEGMENT_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid segment regex");
}

const RESERVED_NAMESPACES: [&str; 6] = ["system", "admin", "dashboard", "default", "log", "root"];

/// Validates that a namespace name is safe and follows naming conventions.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    let clean = namespace.trim();
    if clean.is_empty() {
        return Err(Error::invalid_namespace(namespace, "Namespace cannot be empty"));
    }
    if clean.len() > 50 {
        return Err(Error::invalid_namespace(namespace, "Namespace too long (max 50 characters)"));
    }
    if !SAFE_NAME_REGEX.is_match(clean) {
        return Err(Error::invalid_namespace(
            namespace,
            "Invalid format. Only alphanumeric, dash, and underscore are allowed",
        ));
    }
    if RESERVED_NAMESPACES.iter().any(|r| r.eq_ignore_ascii_case(clean)) {
        return Err(Error::invalid_namespace(namespace, "Reserved namespace name"));
    }
    Ok(())
}

/// Validates that an application name is safe and follows naming conventions.
pub fn validate_app_name(app_name: &str) -> Result<()> {
    let clean = app_name.trim();
    if clean.is_empty() {
        return Err(Error::invalid_app_name(app_name, "Application name cannot be empty"));
    }
    if clean.len() > 50 {
        return Err(Error::invalid_app_name(app_name, "Application name too long (max 50 characters)"));
    }
    if !SAFE_NAME_REGEX.is_match(clean) {
        return Err(Error::invalid_app_name(
            app_name,
            "Invalid format. Only alphanumeric, dash, and underscore are allowed",
        ));
    }
    Ok(())
}

/// Validates that a file path is free of traversal patterns and uses the
/// safe character set. A single leading `/` is tolerated.
pub fn validate_safe_path(file_path: &str) -> Result<()> {
    let mut clean = file_path.trim();
    if clean.is_empty() {
        return Err(Error::invalid_path(file_path, "Path cannot be empty"));
    }
    if clean.contains("..") || clean.contains("./") || clean.contains('\\') {
        return Err(Error::invalid_path(file_path, "Path contains potentially dangerous traversal patterns"));
    }
    if clean.starts_with('/') && clean.len() > 1 {
        clean = &clean[1..];
    }
    if !SAFE_PATH_REGEX.is_match(clean) {
        return Err(Error::invalid_path(
            file_path,
            "Path contains unsafe characters. Only alphanumeric, dash, underscore, slash, and dot are allowed",
        ));
    }
    Ok(())
}

/// Validates that a secret key follows dotted YAML key naming conventions.
pub fn validate_secret_key(secret_key: &str) -> Result<()> {
    let clean = secret_key.trim();
    if clean.is_empty() {
        return Err(Error::invalid_path(secret_key, "Secret key cannot be empty"));
    }
    if clean.contains(' ') {
        return Err(Error::invalid_path(
            secret_key,
            "Secret key cannot contain spaces. Use dot notation for nested keys (e.g. 'parent.child')",
        ));
    }
    if !SECRET_KEY_REGEX.is_match(clean) {
        return Err(Error::invalid_path(
            secret_key,
            "Secret key contains invalid characters. Only alphanumeric characters, dots, dashes, and underscores are allowed",
        ));
    }
    if clean.contains("..") || clean.starts_with('.') || clean.ends_with('.') {
        return Err(Error::invalid_path(
            secret_key,
            "Secret key has invalid dot usage. Dots should only be used to separate nested key parts",
        ));
    }
    for segment in clean.split('.') {
        if !SECRET_SEGMENT_REGEX.is_match(segment) {
            return Err(Error::invalid_path(
                secret_key,
                "Secret key segment contains invalid characters",
            ));
        }
    }
    if clean.len() > 100 {
        return Err(Error::invalid_path(secret_key, "Secret key too long (max 100 characters)"));
    }
    Ok(())
}

/// Validates email format.
pub fn validate_email(email: &str) -> Result<()> {
    let clean = email.trim();
    if clean.is_empty() || !EMAIL_REGEX.is_match(clean) || clean.len() > 100 {
        return Err(Error::invalid_email(email));
    }
    Ok(())
}

/// Validates commit ID format (7-64 hex characters).
pub fn validate_commit_id(commit_id: &str) -> Result<()> {
    let clean = commit_id.trim();
    if clean.is_empty() {
        return Err(Error::invalid_commit_id("Commit ID cannot be empty"));
    }
    if !COMMIT_ID_REGEX.is_match(clean) {
        return Err(Error::invalid_commit_id("Invalid commit ID format"));
    }
    Ok(())
}

/// Validates YAML configuration content, supporting multi-document input.
pub fn validate_yaml_content(content: &str) -> Result<()> {
    for document in serde_yaml::Deserializer::from_str(content) {
        serde_yaml::Value::deserialize(document)
            .map_err(|e| Error::invalid_yaml(format!("Invalid YAML syntax: {}", e)))?;
    }
    Ok(())
}

/// Validates that a commit message is present, bounded, and inert.
pub fn validate_commit_message(message: &str) -> Result<()> {
    let clean = message.trim();
    if clean.is_empty() {
        return Err(Error::invalid_commit_message("Commit message cannot be empty"));
    }
    if clean.len() > 500 {
        return Err(Error::invalid_commit_message(
            "Commit message exceeds maximum length of 500 characters",
        ));
    }
    if clean.contains("<script") || clean.contains("javascript:") || clean.contains("data:text/html")
    {
        return Err(Error::invalid_commit_message(
            "Commit message contains potentially malicious content",
        ));
    }
    Ok(())
}

/// Validates a comma-separated profile list.
pub fn validate_profile(profile: &str) -> Result<()> {
    let clean = profile.trim();
    if clean.is_empty() {
        return Ok(());
    }
    if clean.len() > 200 {
        return Err(Error::invalid_path(profile, "Profile string too long (max 200 characters)"));
    }
    for single in clean.split(',') {
        validate_single_profile(single.trim())?;
    }
    Ok(())
}

fn validate_single_profile(profile: &str) -> Result<()> {
    if profile.is_empty() {
        return Err(Error::invalid_path(profile, "Profile name cannot be empty"));
    }
    if profile.len() > 50 {
        return Err(Error::invalid_path(profile, "Individual profile name too long (max 50 characters)"));
    }
    if profile != "default" && !SAFE_NAME_REGEX.is_match(profile) {
        return Err(Error::invalid_path(
            profile,
            "Invalid profile format. Only alphanumeric, dash, and underscore are allowed",
        ));
    }
    Ok(())
}

/// Validates that the action named in a request matches the endpoint it
/// was sent to. `None` means the request carried no action at all.
pub fn validate_action(expected: &str, actual: Option<&str>) -> Result<()> {
    match actual {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(Error::invalid_action_type(expected, actual)),
        None => Err(Error::invalid_action_type(expected, "null")),
    }
}

/// Validates pull-client resolution parameters before any file access.
pub fn validate_config_request(application: &str, profile: &str, label: &str) -> Result<()> {
    if application.trim().is_empty() {
        return Err(Error::invalid_app_name(application, "Application name cannot be empty"));
    }
    if application.contains("../") || application.contains("..\\") {
        return Err(Error::invalid_app_name(application, "Application name contains invalid path characters"));
    }
    if profile.contains("../") || profile.contains("..\\") {
        return Err(Error::invalid_path(profile, "Profile contains invalid path characters"));
    }
    validate_profile(profile)?;
    if label.contains("../") || label.contains("..\\") {
        return Err(Error::invalid_path(label, "Label contains invalid path characters"));
    }
    Ok(())
}
