//! # Error Handling
//!
//! Error types for the Gitvault configuration service, built on
//! `thiserror`. Every error carries a stable machine-readable code that
//! is surfaced verbatim in API responses.

/// Custom result type for Gitvault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes surfaced to API clients.
pub mod codes {
    pub const INVALID_ACTION_TYPE: &str = "INVALID_ACTION_TYPE";
    pub const INVALID_PATH: &str = "INVALID_PATH";
    pub const INVALID_NAMESPACE: &str = "INVALID_NAMESPACE";
    pub const INVALID_APP_NAME: &str = "INVALID_APP_NAME";
    pub const INVALID_EMAIL: &str = "INVALID_EMAIL";
    pub const INVALID_COMMIT_ID: &str = "INVALID_COMMIT_ID";
    pub const INVALID_CONTENT: &str = "INVALID_CONTENT";
    pub const INVALID_YAML: &str = "INVALID_YAML";
    pub const INVALID_COMMIT_MESSAGE: &str = "INVALID_COMMIT_MESSAGE";
    pub const MISSING_COMMIT_ID: &str = "MISSING_COMMIT_ID";

    pub const NAMESPACE_NOT_FOUND: &str = "NAMESPACE_NOT_FOUND";
    pub const NAMESPACE_ALREADY_EXISTS: &str = "NAMESPACE_ALREADY_EXISTS";
    pub const NAMESPACE_CREATION_FAILED: &str = "NAMESPACE_CREATION_FAILED";

    pub const CONFIG_FILE_NOT_FOUND: &str = "CONFIG_FILE_NOT_FOUND";
    pub const CONFIG_FILE_ALREADY_EXISTS: &str = "CONFIG_FILE_ALREADY_EXISTS";
    pub const CONFIG_FILE_READ_FAILED: &str = "CONFIG_FILE_READ_FAILED";
    pub const CONFIG_FILE_UPDATE_FAILED: &str = "CONFIG_FILE_UPDATE_FAILED";
    pub const CONFIG_FILE_CREATION_FAILED: &str = "CONFIG_FILE_CREATION_FAILED";

    pub const CONFIG_CONFLICT: &str = "CONFIG_CONFLICT";

    pub const ENCRYPTION_FAILED: &str = "ENCRYPTION_FAILED";
    pub const DECRYPTION_FAILED: &str = "DECRYPTION_FAILED";
    pub const KEY_LOAD_FAILED: &str = "KEY_LOAD_FAILED";
    pub const KEY_INITIALIZATION_FAILED: &str = "KEY_INITIALIZATION_FAILED";
    pub const VAULT_FILE_NOT_FOUND: &str = "VAULT_FILE_NOT_FOUND";
    pub const VAULT_OPERATION_FAILED: &str = "VAULT_OPERATION_FAILED";
    pub const SECRET_NOT_FOUND: &str = "SECRET_NOT_FOUND";

    pub const GIT_INIT_FAILED: &str = "GIT_INIT_FAILED";
    pub const GIT_COMMIT_FAILED: &str = "GIT_COMMIT_FAILED";
    pub const GIT_LOG_FAILED: &str = "GIT_LOG_FAILED";
    pub const GIT_DIFF_FAILED: &str = "GIT_DIFF_FAILED";
    pub const GIT_OPERATION_FAILED: &str = "GIT_OPERATION_FAILED";
    pub const GIT_REPOSITORY_ACCESS_FAILED: &str = "GIT_REPOSITORY_ACCESS_FAILED";

    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Main error type for the Gitvault service
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Request input failed validation
    #[error("{message}")]
    Validation { code: &'static str, message: String },

    /// Namespace lifecycle errors
    #[error("{message}")]
    Namespace { code: &'static str, message: String },

    /// Configuration file errors
    #[error("{message}")]
    ConfigFile { code: &'static str, message: String },

    /// Optimistic-concurrency conflict
    #[error("{message}")]
    Conflict { message: String },

    /// Vault and encryption errors
    #[error("{message}")]
    Vault { code: &'static str, message: String },

    /// Git repository errors
    #[error("{message}")]
    Git { code: &'static str, message: String },

    /// Process configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn invalid_namespace<S: Into<String>>(namespace: S, reason: &str) -> Self {
        Self::Validation {
            code: codes::INVALID_NAMESPACE,
            message: format!("Invalid namespace '{}': {}", namespace.into(), reason),
        }
    }

    pub fn invalid_app_name<S: Into<String>>(app_name: S, reason: &str) -> Self {
        Self::Validation {
            code: codes::INVALID_APP_NAME,
            message: format!("Invalid application name '{}': {}", app_name.into(), reason),
        }
    }

    pub fn invalid_path<S: Into<String>>(path: S, reason: &str) -> Self {
        Self::Validation {
            code: codes::INVALID_PATH,
            message: format!("Invalid path '{}': {}", path.into(), reason),
        }
    }

    pub fn invalid_email<S: Into<String>>(email: S) -> Self {
        Self::Validation {
            code: codes::INVALID_EMAIL,
            message: format!("Invalid email address '{}'", email.into()),
        }
    }

    pub fn invalid_commit_id<S: Into<String>>(message: S) -> Self {
        Self::Validation { code: codes::INVALID_COMMIT_ID, message: message.into() }
    }

    pub fn invalid_content<S: Into<String>>(message: S) -> Self {
        Self::Validation { code: codes::INVALID_CONTENT, message: message.into() }
    }

    pub fn invalid_yaml<S: Into<String>>(message: S) -> Self {
        Self::Validation { code: codes::INVALID_YAML, message: message.into() }
    }

    pub fn invalid_commit_message<S: Into<String>>(message: S) -> Self {
        Self::Validation { code: codes::INVALID_COMMIT_MESSAGE, message: message.into() }
    }

    pub fn missing_commit_id<S: Into<String>>(message: S) -> Self {
        Self::Validation { code: codes::MISSING_COMMIT_ID, message: message.into() }
    }

    pub fn invalid_action_type(expected: &str, actual: &str) -> Self {
        Self::Validation {
            code: codes::INVALID_ACTION_TYPE,
            message: format!("Expected action '{}' but request carries '{}'", expected, actual),
        }
    }

    pub fn namespace_not_found<S: Into<String>>(namespace: S) -> Self {
        Self::Namespace {
            code: codes::NAMESPACE_NOT_FOUND,
            message: format!("Namespace '{}' not found", namespace.into()),
        }
    }

    pub fn namespace_already_exists<S: Into<String>>(namespace: S) -> Self {
        Self::Namespace {
            code: codes::NAMESPACE_ALREADY_EXISTS,
            message: format!("Namespace '{}' already exists", namespace.into()),
        }
    }

    pub fn namespace_creation_failed<S: Into<String>>(namespace: S, reason: &str) -> Self {
        Self::Namespace {
            code: codes::NAMESPACE_CREATION_FAILED,
            message: format!("Failed to create namespace '{}': {}", namespace.into(), reason),
        }
    }

    pub fn config_file_not_found<S: Into<String>>(path: S) -> Self {
        Self::ConfigFile {
            code: codes::CONFIG_FILE_NOT_FOUND,
            message: format!("Configuration file not found: {}", path.into()),
        }
    }

    pub fn config_file_already_exists<S: Into<String>>(path: S) -> Self {
        Self::ConfigFile {
            code: codes::CONFIG_FILE_ALREADY_EXISTS,
            message: format!("Configuration file already exists: {}", path.into()),
        }
    }

    pub fn config_file_read_failed<S: Into<String>>(path: S, reason: &str) -> Self {
        Self::ConfigFile {
            code: codes::CONFIG_FILE_READ_FAILED,
            message: format!("Failed to read configuration file '{}': {}", path.into(), reason),
        }
    }

    pub fn config_file_update_failed<S: Into<String>>(path: S, reason: &str) -> Self {
        Self::ConfigFile {
            code: codes::CONFIG_FILE_UPDATE_FAILED,
            message: format!("Failed to update configuration file '{}': {}", path.into(), reason),
        }
    }

    pub fn config_file_creation_failed<S: Into<String>>(path: S, reason: &str) -> Self {
        Self::ConfigFile {
            code: codes::CONFIG_FILE_CREATION_FAILED,
            message: format!("Failed to create configuration file '{}': {}", path.into(), reason),
        }
    }

    pub fn conflict_detected<S: Into<String>>(app_name: S) -> Self {
        Self::Conflict {
            message: format!(
                "Configuration for '{}' was modified by another writer; refresh and retry",
                app_name.into()
            ),
        }
    }

    pub fn encryption_failed<S: Into<String>>(message: S) -> Self {
        Self::Vault { code: codes::ENCRYPTION_FAILED, message: message.into() }
    }

    pub fn decryption_failed<S: Into<String>>(message: S) -> Self {
        Self::Vault { code: codes::DECRYPTION_FAILED, message: message.into() }
    }

    pub fn key_load_failed<S: Into<String>>(message: S) -> Self {
        Self::Vault { code: codes::KEY_LOAD_FAILED, message: message.into() }
    }

    pub fn key_initialization_failed<S: Into<String>>(message: S) -> Self {
        Self::Vault { code: codes::KEY_INITIALIZATION_FAILED, message: message.into() }
    }

    pub fn vault_file_not_found<S: Into<String>>(namespace: S) -> Self {
        Self::Vault {
            code: codes::VAULT_FILE_NOT_FOUND,
            message: format!("Vault file not found for namespace '{}'", namespace.into()),
        }
    }

    pub fn vault_operation_failed<S: Into<String>>(message: S) -> Self {
        Self::Vault { code: codes::VAULT_OPERATION_FAILED, message: message.into() }
    }

    pub fn secret_not_found<S: Into<String>>(key: S) -> Self {
        Self::Vault {
            code: codes::SECRET_NOT_FOUND,
            message: format!("Secret not found: {}", key.into()),
        }
    }

    pub fn git_init_failed<S: Into<String>>(namespace: S, reason: &str) -> Self {
        Self::Git {
            code: codes::GIT_INIT_FAILED,
            message: format!(
                "Failed to initialize repository for namespace '{}': {}",
                namespace.into(),
                reason
            ),
        }
    }

    pub fn git_commit_failed<S: Into<String>>(path: S, reason: &str) -> Self {
        Self::Git {
            code: codes::GIT_COMMIT_FAILED,
            message: format!("Failed to commit '{}': {}", path.into(), reason),
        }
    }

    pub fn git_log_failed<S: Into<String>>(path: S, reason: &str) -> Self {
        Self::Git {
            code: codes::GIT_LOG_FAILED,
            message: format!("Failed to read log for '{}': {}", path.into(), reason),
        }
    }

    pub fn git_diff_failed<S: Into<String>>(commit_id: S, reason: &str) -> Self {
        Self::Git {
            code: codes::GIT_DIFF_FAILED,
            message: format!("Failed to diff commit '{}': {}", commit_id.into(), reason),
        }
    }

    pub fn git_operation_failed<S: Into<String>>(namespace: S, reason: &str) -> Self {
        Self::Git {
            code: codes::GIT_OPERATION_FAILED,
            message: format!("Git operation failed in namespace '{}': {}", namespace.into(), reason),
        }
    }

    pub fn git_repository_access_failed<S: Into<String>>(namespace: S, reason: &str) -> Self {
        Self::Git {
            code: codes::GIT_REPOSITORY_ACCESS_FAILED,
            message: format!(
                "Repository access failed for namespace '{}': {}",
                namespace.into(),
                reason
            ),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// The stable code surfaced in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation { code, .. }
            | Error::Namespace { code, .. }
            | Error::ConfigFile { code, .. }
            | Error::Vault { code, .. }
            | Error::Git { code, .. } => code,
            Error::Conflict { .. } => codes::CONFIG_CONFLICT,
            Error::Config(_) | Error::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// HTTP status code that should be returned for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation { .. } => 400,
            Error::Namespace { code, .. } => match *code {
                codes::NAMESPACE_NOT_FOUND => 404,
                codes::NAMESPACE_ALREADY_EXISTS => 409,
                _ => 500,
            },
            Error::ConfigFile { code, .. } => match *code {
                codes::CONFIG_FILE_NOT_FOUND => 404,
                codes::CONFIG_FILE_ALREADY_EXISTS => 409,
                _ => 500,
            },
            Error::Conflict { .. } => 409,
            Error::Vault { code, .. } => match *code {
                codes::VAULT_FILE_NOT_FOUND | codes::SECRET_NOT_FOUND => 404,
                _ => 500,
            },
            Error::Git { .. } => 500,
            Error::Config(_) | Error::Internal(_) => 500,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::Config(error.to_string())
    }
}
