// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Business-rule violation surfaced as 409 Conflict.
/// The wire representation is a stable snake_case reason code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    MaxAttemptsReached,
    AttemptInProgress,
    AlreadySubmitted,
    TimeLimitExceeded,
}

impl ConflictReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictReason::MaxAttemptsReached => "max_attempts_reached",
            ConflictReason::AttemptInProgress => "attempt_in_progress",
            ConflictReason::AlreadySubmitted => "already_submitted",
            ConflictReason::TimeLimitExceeded => "time_limit_exceeded",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ConflictReason::MaxAttemptsReached => "Maximum attempts reached",
            ConflictReason::AttemptInProgress => "An attempt is already in progress",
            ConflictReason::AlreadySubmitted => "Attempt has already been submitted",
            ConflictReason::TimeLimitExceeded => "Time limit exceeded",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict, carries a machine-readable reason code
    Conflict(ConflictReason),

    // Authoring-data problem (insufficient or invalid question pool).
    // Not a user error; surfaced as a server-side failure.
    Validation(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(reason) => (
                StatusCode::CONFLICT,
                json!({ "error": reason.message(), "reason": reason.as_str() }),
            ),
            AppError::Validation(msg) => {
                tracing::error!("Evaluation data error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
