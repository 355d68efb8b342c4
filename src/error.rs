//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Main error type for the gate server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The CDN (or whatever the proxy targets) could not be reached
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Session service unavailable: {0}")]
    SessionUnavailable(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] axum::http::Error),
}

/// A redirect pointed the proxy at a host outside `allowed_hosts`.
#[derive(Error, Debug)]
#[error("redirect to {0} refused")]
pub struct RedirectRefused(pub String);

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ServerError>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            // Details stay in the log; players only need to know playback failed.
            ServerError::Upstream(_) | ServerError::HttpClient(_) => (
                StatusCode::BAD_GATEWAY,
                "Upstream media unavailable".to_string(),
            ),
            ServerError::SessionUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Session service unavailable".to_string(),
            ),
            ServerError::Config(_) | ServerError::Io(_) | ServerError::Http(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }

        (status, body).into_response()
    }
}
