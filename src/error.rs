//! Error types for the INN check service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Call to the validation service failed at the HTTP layer.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid validation service URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation service answered with a non-success status.
    #[error("Validation service error ({status}): {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// No session with this id.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Missing or invalid user token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Http(_) | Error::Service { .. } => StatusCode::BAD_GATEWAY,
            Error::InvalidUrl(_) | Error::Json(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}
