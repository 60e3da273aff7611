//! Error types for the HTTP layer.

use crate::response::ErrorEnvelope;
use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use autorest_core::{EngineError, ErrorKind};
use thiserror::Error;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failure reported by the engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Malformed path, query string or body.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or unknown bearer token.
    #[error("Missing or invalid bearer token")]
    Unauthorized,

    /// No route matched.
    #[error("{0}")]
    RouteNotFound(String),

    /// The route exists but not for this method.
    #[error("Method {0} is not allowed on this route")]
    MethodNotAllowed(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Engine(e) => e.kind(),
            ApiError::BadRequest(_) | ApiError::MethodNotAllowed(_) => ErrorKind::Validation,
            ApiError::Unauthorized => ErrorKind::Auth,
            ApiError::RouteNotFound(_) => ErrorKind::NotFound,
        }
    }

    pub fn status(&self) -> StatusCode {
        if let ApiError::MethodNotAllowed(_) = self {
            return StatusCode::METHOD_NOT_ALLOWED;
        }
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Discovery | ErrorKind::Execution => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Engine(e) => e.public_message(),
            other => other.to_string(),
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            status_code: self.status().as_u16(),
            message: self.public_message(),
            error: Some(self.kind().name()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind().name(), "Request failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind().name(), "Request rejected");
        }

        let body = Json(self.envelope());
        if matches!(self, ApiError::Unauthorized) {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }
        (status, body).into_response()
    }
}
