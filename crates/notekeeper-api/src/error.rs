//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Error returned from handlers, rendered as `{"error": msg}`.
#[derive(Debug)]
pub enum ApiError {
    Internal(String),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
}

impl From<notekeeper_core::Error> for ApiError {
    fn from(err: notekeeper_core::Error) -> Self {
        match err {
            notekeeper_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            notekeeper_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            notekeeper_core::Error::NoteNotFound(id) => {
                ApiError::NotFound(format!("Note {} not found", id))
            }
            notekeeper_core::Error::Internal(msg) => ApiError::Internal(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
