//! Error types for the RAG system

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed tenant identifier
    #[error("{0}")]
    InvalidTenant(String),

    /// Request body failed schema validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request content rejected (empty or oversized text, no files)
    #[error("{0}")]
    BadRequest(String),

    /// PDF text extraction failed for a single file
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Batch upload produced no chunks at all
    #[error("{0}")]
    NoExtractableContent(String),

    /// Embedding model unreachable or returned an unexpected shape
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Vector index unreachable or rejected the operation
    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    /// Generative model unreachable or returned no text
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid tenant error
    pub fn invalid_tenant(message: impl Into<String>) -> Self {
        Self::InvalidTenant(message.into())
    }

    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(message.into())
    }

    /// Create a vector store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationUnavailable(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short machine-readable kind, used as `error_type` in responses
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidTenant(_) => "invalid_tenant",
            Error::Validation(_) => "validation_error",
            Error::BadRequest(_) => "bad_request",
            Error::FileParse { .. } => "parse_error",
            Error::NoExtractableContent(_) => "no_extractable_content",
            Error::EmbeddingUnavailable(_) => "embedding_unavailable",
            Error::StoreUnavailable(_) => "store_unavailable",
            Error::GenerationUnavailable(_) => "generation_unavailable",
            Error::Config(_) => "config_error",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidTenant(_) => StatusCode::UNAUTHORIZED,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::BadRequest(_) | Error::FileParse { .. } | Error::NoExtractableContent(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to clients.
    ///
    /// Validation failures carry their precise reason; downstream failures are
    /// reduced to a generic message and only logged in full.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidTenant(msg)
            | Error::BadRequest(msg)
            | Error::Validation(msg)
            | Error::NoExtractableContent(msg) => msg.clone(),
            Error::FileParse { .. } => self.to_string(),
            Error::EmbeddingUnavailable(_) => "Embedding service is unavailable".to_string(),
            Error::StoreUnavailable(_) => "Vector store is unavailable".to_string(),
            Error::GenerationUnavailable(_) => "Answer generation service is unavailable".to_string(),
            Error::Config(_) | Error::Io(_) | Error::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error_type = self.kind(), "Request failed: {}", self);
        }

        let body = Json(json!({
            "detail": self.public_message(),
            "error_type": self.kind(),
        }));

        if matches!(self, Error::InvalidTenant(_)) {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::invalid_tenant("Missing X-Tenant-ID header").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::Validation("question".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::NoExtractableContent("none".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::store("timeout").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_downstream_errors_do_not_leak_details() {
        let err = Error::embedding("connection refused at 10.0.0.7:11434");
        assert!(!err.public_message().contains("10.0.0.7"));

        let err = Error::invalid_tenant("Tenant ID must be between 3 and 64 characters");
        assert_eq!(
            err.public_message(),
            "Tenant ID must be between 3 and 64 characters"
        );
    }
}
