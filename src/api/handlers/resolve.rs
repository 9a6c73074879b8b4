//! Pull-client resolution endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::error::ApiError;
use crate::api::handlers::run_blocking;
use crate::api::routes::ApiState;
use crate::resolver::ResolvedConfig;

/// `GET /{application}/{profile}` — resolve against the default label.
pub async fn resolve_default(
    State(state): State<ApiState>,
    Path((application, profile)): Path<(String, String)>,
) -> Result<Json<ResolvedConfig>, ApiError> {
    resolve(state, application, profile, String::new()).await
}

/// `GET /{application}/{profile}/{*label}` — resolve against
/// `<namespace>[/<subpath>]`.
pub async fn resolve_with_label(
    State(state): State<ApiState>,
    Path((application, profile, label)): Path<(String, String, String)>,
) -> Result<Json<ResolvedConfig>, ApiError> {
    resolve(state, application, profile, label).await
}

async fn resolve(
    state: ApiState,
    application: String,
    profile: String,
    label: String,
) -> Result<Json<ResolvedConfig>, ApiError> {
    let resolver = state.resolver.clone();
    let profile = if profile.trim().is_empty() { "default".to_string() } else { profile };
    let resolved =
        run_blocking(move || resolver.resolve(&application, &profile, &label)).await?;
    Ok(Json(resolved))
}
