//! Error types for the analysis service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Analysis service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed submission (empty query, missing file)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upload could not be persisted
    #[error("Storage error: {0}")]
    Storage(String),

    /// Document text could not be extracted
    #[error("Failed to extract text from '{path}': {message}")]
    Extraction { path: String, message: String },

    /// Analysis engine call failed or timed out
    #[error("Analysis engine error: {0}")]
    Engine(String),

    /// Engine output did not match the result schema
    #[error("Failed to parse analysis result: {0}")]
    Parse(String),

    /// Job id was never issued
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Job store error
    #[error("Database error: {0}")]
    Database(String),

    /// Work item could not be handed to the worker
    #[error("Queue error: {0}")]
    Queue(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an extraction error
    pub fn extraction(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an engine error
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            Error::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg.clone()),
            Error::Extraction { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "extraction_error",
                self.to_string(),
            ),
            Error::Engine(msg) => (StatusCode::BAD_GATEWAY, "engine_error", msg.clone()),
            Error::Parse(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "parse_error", msg.clone()),
            Error::JobNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Job not found: {}", id),
            ),
            Error::Database(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", msg.clone())
            }
            Error::Queue(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "queue_error", msg.clone()),
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", msg.clone()),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
