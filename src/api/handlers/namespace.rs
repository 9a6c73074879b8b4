//! Namespace lifecycle and inspection endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::ApiError;
use crate::api::handlers::run_blocking;
use crate::api::routes::ApiState;
use crate::notify::NamespaceNotifications;
use crate::storage::NamespaceEvents;

#[derive(Debug, Deserialize)]
pub struct NamespaceRequest {
    pub namespace: String,
    #[serde(default)]
    pub path: Option<String>,
}

pub async fn create_namespace(
    State(state): State<ApiState>,
    Json(request): Json<NamespaceRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let namespace = request.namespace.trim().to_string();
    let store = state.store.clone();
    run_blocking(move || store.create_namespace(&namespace)).await?;

    info!(namespace = %request.namespace, "Namespace created via API");
    Ok((StatusCode::CREATED, Json(json!({ "message": "Namespace created successfully" }))))
}

pub async fn list_namespaces(
    State(state): State<ApiState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let store = state.store.clone();
    let namespaces = run_blocking(move || store.list_namespaces()).await?;
    Ok(Json(namespaces))
}

pub async fn list_directory(
    State(state): State<ApiState>,
    Json(request): Json<NamespaceRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    let store = state.store.clone();
    let namespace = request.namespace;
    let path = request.path.unwrap_or_default();
    let entries = run_blocking(move || store.list_directory(&namespace, &path)).await?;
    Ok(Json(entries))
}

pub async fn delete_namespace(
    State(state): State<ApiState>,
    Json(request): Json<NamespaceRequest>,
) -> Result<Json<Value>, ApiError> {
    let namespace = request.namespace.trim().to_string();
    let store = state.store.clone();
    run_blocking(move || store.delete_namespace(&namespace)).await?;

    info!(namespace = %request.namespace, "Namespace deleted via API");
    Ok(Json(json!({ "message": "Namespace deleted successfully" })))
}

pub async fn namespace_events(
    State(state): State<ApiState>,
    Json(request): Json<NamespaceRequest>,
) -> Result<Json<NamespaceEvents>, ApiError> {
    let store = state.store.clone();
    let namespace = request.namespace;
    let events = run_blocking(move || store.namespace_events(&namespace)).await?;
    Ok(Json(events))
}

pub async fn namespace_notifications(
    State(state): State<ApiState>,
    Json(request): Json<NamespaceRequest>,
) -> Result<Json<NamespaceNotifications>, ApiError> {
    let store = state.store.clone();
    let namespace = request.namespace;
    let notifications = run_blocking(move || store.namespace_notifications(&namespace)).await?;
    Ok(Json(notifications))
}
