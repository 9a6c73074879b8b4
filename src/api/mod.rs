//! # HTTP API
//!
//! Management endpoints (namespace, config, vault) and the pull-client
//! resolution endpoints, served over axum. Git and filesystem work runs
//! on blocking worker threads; handlers stay async.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
