//! API error types and JSON error response formatting.
//!
//! Every error response body is `{ "error": "<message>" }`. Internal
//! failures are logged here and reach the client only as a generic message.

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use spur_chat::ChatError;

/// Message sent for every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid input.
    BadRequest(String),
    /// 404 Not Found - well-formed request naming nothing.
    NotFound(String),
    /// 413 Payload Too Large - body over the configured limit.
    PayloadTooLarge(String),
    /// 500 Internal Server Error - detail is logged, never returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::SessionNotFound(_) => ApiError::NotFound("Session not found".to_string()),
            ChatError::EmptyMessage => ApiError::BadRequest("Message cannot be empty".to_string()),
            ChatError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("Payload Too Large".to_string())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}
