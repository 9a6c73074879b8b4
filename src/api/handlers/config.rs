//! Configuration file CRUD endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::api::dto::{ActionType, Payload};
use crate::api::error::ApiError;
use crate::api::handlers::run_blocking;
use crate::api::routes::ApiState;
use crate::errors::Error;
use crate::storage::config_store::{DeleteRequest, UpdateRequest};
use crate::storage::{CommitChanges, FileHistory};

pub async fn create_config(
    State(state): State<ApiState>,
    Json(payload): Json<Payload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    payload.validate_for(ActionType::Create)?;

    let file_path = payload.file_path();
    let store = state.store.clone();
    let app_name = payload.app_name.clone();
    let email = payload.email.clone();
    run_blocking(move || store.initialize(&file_path, &app_name, &email)).await?;

    info!(app_name = %payload.app_name, namespace = %payload.namespace, "Configuration created via API");
    Ok((StatusCode::CREATED, Json(json!({ "message": "Configuration created successfully" }))))
}

pub async fn fetch_config(
    State(state): State<ApiState>,
    Json(payload): Json<Payload>,
) -> Result<Json<Payload>, ApiError> {
    payload.validate_for(ActionType::Fetch)?;

    let file_path = payload.file_path();
    let store = state.store.clone();
    let (content, commit_id) = run_blocking(move || {
        let content = store.read(&file_path)?;
        let commit_id = store.latest_commit_id(&file_path)?;
        Ok((content, commit_id))
    })
    .await?;

    let mut response = payload;
    response.content = Some(content);
    response.commit_id = Some(commit_id);
    Ok(Json(response))
}

pub async fn update_config(
    State(state): State<ApiState>,
    Json(payload): Json<Payload>,
) -> Result<Json<Value>, ApiError> {
    payload.validate_for(ActionType::Update)?;

    let expected_commit_id = payload
        .commit_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::missing_commit_id("Commit ID is required for update operations"))?
        .to_string();

    let request = UpdateRequest {
        app_name: payload.app_name.clone(),
        content: payload.content.clone().unwrap_or_default(),
        message: payload.message.clone().unwrap_or_default(),
        email: payload.email.clone(),
        expected_commit_id,
    };

    let file_path = payload.file_path();
    let store = state.store.clone();
    let commit_id = run_blocking(move || store.update(&file_path, &request)).await?;

    info!(app_name = %payload.app_name, commit_id, "Configuration updated via API");
    Ok(Json(json!({ "message": "Configuration updated successfully", "commitId": commit_id })))
}

pub async fn config_history(
    State(state): State<ApiState>,
    Json(payload): Json<Payload>,
) -> Result<Json<FileHistory>, ApiError> {
    payload.validate_for(ActionType::History)?;

    let file_path = payload.file_path();
    let store = state.store.clone();
    let history = run_blocking(move || store.history(&file_path)).await?;
    Ok(Json(history))
}

pub async fn commit_changes(
    State(state): State<ApiState>,
    Json(payload): Json<Payload>,
) -> Result<Json<CommitChanges>, ApiError> {
    payload.validate_for(ActionType::Changes)?;

    let commit_id = payload
        .commit_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::missing_commit_id("Commit ID is required for change queries"))?
        .to_string();

    let namespace = payload.namespace.clone();
    let store = state.store.clone();
    let changes = run_blocking(move || store.commit_changes(&commit_id, &namespace)).await?;
    Ok(Json(changes))
}

pub async fn delete_config(
    State(state): State<ApiState>,
    Json(payload): Json<Payload>,
) -> Result<Json<Value>, ApiError> {
    payload.validate_for(ActionType::Delete)?;

    let request = DeleteRequest {
        message: payload.message.clone().unwrap_or_default(),
        email: payload.email.clone(),
    };

    let file_path = payload.file_path();
    let store = state.store.clone();
    run_blocking(move || store.delete(&file_path, &request)).await?;

    info!(app_name = %payload.app_name, namespace = %payload.namespace, "Configuration deleted via API");
    Ok(Json(json!({ "message": "Configuration deleted successfully" })))
}
