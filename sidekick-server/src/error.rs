//! Error types for the HTTP API

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors returned by API handlers and the server loop
#[derive(Error, Debug)]
pub enum ServerError {
    /// Core failure (unauthenticated session, invalid task, ...)
    #[error(transparent)]
    Core(#[from] sidekick_core::Error),

    /// Request body or query is unusable
    #[error("{0}")]
    BadRequest(String),

    /// The OAuth exchange with GitHub failed
    #[error("GitHub login failed: {0}")]
    OAuth(String),

    /// GitHub rejected or failed a request made for the user
    #[error("{0}")]
    Upstream(String),

    /// A required setting is missing
    #[error("Server is not configured: {0}")]
    NotConfigured(String),

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Server loop failed
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        use sidekick_core::Error as Core;

        match self {
            ServerError::Core(Core::Unauthenticated) => StatusCode::UNAUTHORIZED,
            ServerError::Core(Core::InvalidTask(_)) | ServerError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Core(Core::Llm(_)) | ServerError::OAuth(_) | ServerError::Upstream(_) => {
                StatusCode::BAD_GATEWAY
            }
            ServerError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, %status, "Request failed");
        }

        let body = json!({ "status": "error", "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServerError::from(sidekick_core::Error::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::from(sidekick_core::Error::InvalidTask("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::OAuth("bad_verification_code".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_unauthenticated_message() {
        assert_eq!(
            ServerError::from(sidekick_core::Error::Unauthenticated).to_string(),
            "User not authenticated."
        );
    }
}
