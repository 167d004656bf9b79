//! API error types and handling.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use stageline::{ErrorKind, EtlError};

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from client.
    BadRequest(String),
    /// Internal server error.
    Internal(String),
    /// Error from the stageline library.
    Etl(EtlError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
            ApiError::Etl(e) => {
                let (status, error) = match e.kind() {
                    ErrorKind::Config => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
                    ErrorKind::Input => (StatusCode::BAD_REQUEST, "input_error"),
                    ErrorKind::Transform => (StatusCode::INTERNAL_SERVER_ERROR, "transform_error"),
                    ErrorKind::Other => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
                };
                (status, error, e.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(error, %message, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<EtlError> for ApiError {
    fn from(err: EtlError) -> Self {
        ApiError::Etl(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Etl(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {}
