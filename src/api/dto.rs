//! Request payloads for the management API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{Error, Result};
use crate::validation;

/// Configuration management operations. Each action corresponds to one
/// `/config/*` endpoint and the request body must name the action of
/// the endpoint it is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Create,
    Fetch,
    Update,
    History,
    Changes,
    Delete,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionType::Create => "create",
            ActionType::Fetch => "fetch",
            ActionType::Update => "update",
            ActionType::History => "history",
            ActionType::Changes => "changes",
            ActionType::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}

/// Body of every `/config/*` request; optional fields are required only
/// by specific actions.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    #[validate(length(min = 1, max = 50, message = "Application name must be provided"))]
    pub app_name: String,

    #[validate(length(min = 1, max = 50, message = "Namespace must be provided"))]
    pub namespace: String,

    #[validate(custom(function = "validate_payload_path"))]
    pub path: String,

    pub action: Option<ActionType>,

    #[validate(email(message = "A valid email address is mandatory"))]
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
}

impl Payload {
    /// Configuration file name derived from the application name.
    pub fn file_name(&self) -> String {
        format!("{}.yml", self.app_name.trim())
    }

    /// Full file path `<namespace><path><appName>.yml`.
    pub fn file_path(&self) -> String {
        let namespace = self.namespace.trim();
        let path = self.path.trim();
        let separator = if path.ends_with('/') { "" } else { "/" };
        format!("{}{}{}{}", namespace, path, separator, self.file_name())
    }

    /// Check field-level constraints and that the request action matches
    /// the endpoint.
    pub fn validate_for(&self, expected: ActionType) -> Result<()> {
        self.validate()
            .map_err(|e| Error::invalid_content(format!("Invalid request payload: {}", e)))?;
        let actual = self.action.map(|action| action.to_string());
        validation::validate_action(&expected.to_string(), actual.as_deref())
    }
}

fn validate_payload_path(path: &str) -> std::result::Result<(), validator::ValidationError> {
    if !path.starts_with('/') {
        return Err(validator::ValidationError::new("path_must_start_with_slash"));
    }
    Ok(())
}
