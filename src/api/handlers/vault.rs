//! Vault endpoints: decrypted reads and full-replace writes.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::ApiError;
use crate::api::handlers::run_blocking;
use crate::api::routes::ApiState;
use crate::errors::Error;

pub async fn get_vault(
    State(state): State<ApiState>,
    Json(request): Json<BTreeMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let namespace = request
        .get("namespace")
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::invalid_namespace("", "Namespace is required"))?;

    let vault = state.vault.clone();
    let lookup = namespace.clone();
    let secrets = run_blocking(move || vault.get_vault(&lookup).map(|s| (*s).clone())).await?;

    Ok(Json(json!({
        "namespace": namespace,
        "count": secrets.len(),
        "secrets": secrets,
    })))
}

pub async fn update_vault(
    State(state): State<ApiState>,
    Json(request): Json<BTreeMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let mut secrets = request;
    let namespace = secrets
        .remove("namespace")
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::invalid_namespace("", "Namespace is required"))?;
    let email = secrets
        .remove("email")
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| Error::invalid_email(""))?;
    let commit_message = secrets
        .remove("commitMessage")
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| Error::invalid_commit_message("Commit message is required"))?;

    let count = secrets.len();
    let vault = state.vault.clone();
    let target = namespace.clone();
    run_blocking(move || vault.update_vault(&target, &secrets, &email, &commit_message)).await?;

    info!(namespace, count, "Vault updated via API");
    Ok(Json(json!({
        "message": "Vault updated successfully",
        "namespace": namespace,
        "count": count,
    })))
}
