use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::engine::EngineError;

/// Boundary-level errors. Each kind maps to a distinct response code:
/// 400 validation, 401 auth, 403 permission, 404 not-found, 409 overlap,
/// 500 journal/unexpected.
#[derive(Debug)]
pub enum ApiError {
    MissingField(&'static str),
    BadDatetime(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    PermissionDenied,
    Auth(&'static str),
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::UserNotFound(_)
            | EngineError::RoomNotFound(_)
            | EngineError::BookingNotFound(_) => ApiError::NotFound(e.to_string()),
            EngineError::Overlap { .. } => ApiError::Conflict(e.to_string()),
            EngineError::InvalidRange { .. } | EngineError::InvalidInput(_) => {
                ApiError::Validation(e.to_string())
            }
            EngineError::Journal(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                format!("Missing field: {field}"),
            ),
            ApiError::BadDatetime(value) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid datetime: {value}"),
            ),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "Permission denied - booking belongs to another user".to_string(),
            ),
            ApiError::Auth(msg) => {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "Invalid or missing token",
                        "message": msg,
                    })),
                )
                    .into_response();
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
