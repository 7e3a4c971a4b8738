//! Error taxonomy for the watcher service.
//!
//! External AI failures surface as 500s with a short message. Store failures
//! during notification ingest and task-flow persistence never reach this
//! type's HTTP mapping; callers log and swallow them so the device sees
//! success and does not retry.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Result type alias for fallible service operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can surface from request handling.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transcription service error: {0}")]
    UpstreamTranscription(String),

    #[error("speech synthesis error: {0}")]
    UpstreamSynthesis(String),

    #[error("vision analysis error: {0}")]
    UpstreamVision(String),

    #[error("language model error: {0}")]
    UpstreamLlm(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("response encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // The firmware checks `code` in every JSON body it parses.
        let body = match self {
            ServerError::Unauthorized => serde_json::json!({ "code": 401 }),
            ref e => serde_json::json!({
                "code": status.as_u16(),
                "error": e.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}
