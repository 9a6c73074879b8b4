//! HTTP error responses with stable error codes.

use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::Local;
use serde::Serialize;

use crate::errors::Error;

/// Wrapper that renders a service [`Error`] as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

/// JSON body returned for every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: u16,
    pub error: &'static str,
    pub message: String,
    pub error_code: &'static str,
}

impl ApiError {
    fn family(&self) -> &'static str {
        match &self.0 {
            Error::Validation { .. } => "Validation Error",
            Error::Namespace { .. } => "Namespace Error",
            Error::ConfigFile { .. } => "Configuration File Error",
            Error::Conflict { .. } => "Configuration Conflict",
            Error::Vault { .. } => "Vault Error",
            Error::Git { .. } => "Git Operation Error",
            Error::Config(_) | Error::Internal(_) => "Internal Server Error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "Request failed");
        } else {
            tracing::warn!(code = self.0.code(), error = %self.0, "Request rejected");
        }

        let body = ErrorBody {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            status: status.as_u16(),
            error: self.family(),
            message: self.0.to_string(),
            error_code: self.0.code(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}
