//! API error types for the RFP/RFI pipeline server.
//!
//! Maps core domain errors to HTTP status codes and JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rfp_core::error::{BlobError, ErrorKind, PipelineError, StorageError};
use serde_json::json;

/// API error type for route handlers.
pub enum ApiError {
    /// Underlying storage/database error.
    Storage(StorageError),
    /// Blob store error (upload, download).
    Blob(BlobError),
    /// A full pipeline run failed; mapped by error kind.
    Pipeline(PipelineError),
    /// Requested resource not found.
    NotFound(String),
    /// Bad request (invalid input, missing documents, etc.).
    BadRequest(String),
    /// Conflict (pipeline already running).
    Conflict(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        Self::Blob(err)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self::Pipeline(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Storage(e) => {
                tracing::error!("storage error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::Blob(BlobError::NotFound { key }) => (StatusCode::NOT_FOUND, format!("blob not found: {key}")),
            Self::Blob(e) => {
                tracing::error!("blob store error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::Pipeline(e) => {
                let status = match e.kind() {
                    ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::Conflict => StatusCode::CONFLICT,
                    ErrorKind::Transient | ErrorKind::StagePartial | ErrorKind::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
                };
                tracing::error!("pipeline error: {e}");
                (status, e.to_string())
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = axum::Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
