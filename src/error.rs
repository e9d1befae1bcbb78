/// Unified error types for the Aurora identity service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for DID resolution
///
/// "Document absent" is not an error: resolvers report it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// DID method is neither `web` nor `plc`
    #[error("Unsupported DID method: {0}")]
    UnsupportedMethod(String),

    /// Supported method but unsupported shape (e.g. did:web with a path)
    #[error("Unsupported DID format: {0}")]
    UnsupportedDidFormat(String),

    /// Network call exceeded the configured budget
    #[error("DID resolution timed out: {0}")]
    Timeout(String),

    /// PLC directory answered with a non-404 error status
    #[error("PLC directory error: {status} {message}")]
    DirectoryError { status: u16, message: String },

    /// Transport-level HTTP failures (connection refused, TLS, ...)
    #[error("HTTP error: {0}")]
    Http(String),

    /// DID resolved to no document where one was required
    #[error("Could not resolve DID: {0}")]
    DidNotFound(String),

    /// Document is valid but lacks the atproto key, handle or PDS
    #[error("Poorly formatted DID document: {0}")]
    PoorlyFormattedDidDocument(String),

    /// Cache port failures
    #[error("Cache error: {0}")]
    Cache(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolverError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ResolverError::UnsupportedMethod(_) => "unsupported_method",
            ResolverError::UnsupportedDidFormat(_) => "unsupported_format",
            ResolverError::Timeout(_) => "timeout",
            ResolverError::DirectoryError { .. } => "directory_error",
            ResolverError::Http(_) => "http",
            ResolverError::DidNotFound(_) => "not_found",
            ResolverError::PoorlyFormattedDidDocument(_) => "poorly_formatted",
            ResolverError::Cache(_) | ResolverError::Database(_) => "cache",
            ResolverError::Validation(_) => "validation",
            ResolverError::Internal(_) | ResolverError::Io(_) => "internal",
        }
    }
}

/// XRPC error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct XrpcErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert ResolverError to HTTP response
impl IntoResponse for ResolverError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ResolverError::UnsupportedMethod(_)
            | ResolverError::UnsupportedDidFormat(_)
            | ResolverError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            ResolverError::DidNotFound(_) => (
                StatusCode::NOT_FOUND,
                "DidNotFound",
                self.to_string(),
            ),
            ResolverError::PoorlyFormattedDidDocument(_) => (
                StatusCode::BAD_REQUEST,
                "PoorlyFormattedDidDocument",
                self.to_string(),
            ),
            ResolverError::Timeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                "UpstreamTimeout",
                self.to_string(),
            ),
            ResolverError::DirectoryError { .. } | ResolverError::Http(_) => (
                StatusCode::BAD_GATEWAY,
                "UpstreamFailure",
                self.to_string(),
            ),
            ResolverError::Database(_)
            | ResolverError::Cache(_)
            | ResolverError::Internal(_)
            | ResolverError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(XrpcErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for resolver operations
pub type ResolverResult<T> = Result<T, ResolverError>;
