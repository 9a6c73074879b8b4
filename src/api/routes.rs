//! Router assembly for the management and resolver APIs.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::notify::Notifier;
use crate::resolver::Resolver;
use crate::storage::{ConfigStore, VaultStore};

use super::handlers::{config, namespace, resolve, vault};

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<ConfigStore>,
    pub vault: Arc<VaultStore>,
    pub resolver: Arc<Resolver>,
    pub notifier: Arc<Notifier>,
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/namespace/create", post(namespace::create_namespace))
        .route("/namespace/list", post(namespace::list_namespaces))
        .route("/namespace/files", post(namespace::list_directory))
        .route("/namespace/delete", post(namespace::delete_namespace))
        .route("/namespace/events", post(namespace::namespace_events))
        .route("/namespace/notify", post(namespace::namespace_notifications))
        .route("/config/create", post(config::create_config))
        .route("/config/fetch", post(config::fetch_config))
        .route("/config/update", post(config::update_config))
        .route("/config/history", post(config::config_history))
        .route("/config/changes", post(config::commit_changes))
        .route("/config/delete", post(config::delete_config))
        .route("/vault/get", post(vault::get_vault))
        .route("/vault/update", post(vault::update_vault))
        .route("/{application}/{profile}", get(resolve::resolve_default))
        .route("/{application}/{profile}/{*label}", get(resolve::resolve_with_label))
        .with_state(state)
}
