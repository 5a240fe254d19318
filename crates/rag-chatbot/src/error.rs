//! Error types for the chatbot

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for chatbot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Chatbot errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    VectorDb(String),

    /// No index has been built yet
    #[error("Index not found in {0}")]
    IndexMissing(String),

    /// Chat completion error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Web search error
    #[error("Web search error: {0}")]
    Search(String),

    /// Malformed client request
    #[error("{0}")]
    InvalidRequest(String),

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
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector index error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create a web search error
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FileParse { .. } | Error::UnsupportedFileType(_) => StatusCode::BAD_REQUEST,
            Error::InvalidRequest(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::IndexMissing(_) => StatusCode::CONFLICT,
            Error::Llm(_) | Error::Embedding(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Search(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::VectorDb(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error returned from HTTP handlers, tagged with the request's trace id
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub trace_id: String,
}

impl ApiError {
    /// Wrap a crate error for a given request
    pub fn new(err: Error, trace_id: impl Into<String>) -> Self {
        Self {
            status: err.status_code(),
            error: err.to_string(),
            trace_id: trace_id.into(),
        }
    }

    /// A 400 with a fixed message
    pub fn bad_request(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: message.into(),
            trace_id: trace_id.into(),
        }
    }

    /// Override the status code (handlers that always answer 500 on failure)
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "ok": false,
            "error": self.error,
            "trace_id": self.trace_id,
        }));

        (self.status, body).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        ApiError::new(self, String::new()).into_response()
    }
}
