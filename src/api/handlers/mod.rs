//! Request handlers for the management and resolver endpoints.

pub mod config;
pub mod namespace;
pub mod resolve;
pub mod vault;

use crate::api::error::ApiError;
use crate::errors::{Error, Result};

/// Run a Git/filesystem-bound operation off the async runtime.
pub(crate) async fn run_blocking<T, F>(operation: F) -> std::result::Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|e| ApiError::from(Error::internal(format!("Worker task failed: {}", e))))?
        .map_err(ApiError::from)
}
