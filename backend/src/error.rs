// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::{
    ai::GenerationError,
    models::{attempt::AttemptError, question::MalformedBank},
    services::attempts::RegistryError,
    store::StoreError,
};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 502 Bad Gateway: the AI provider failed or answered with something unusable
    Generation(String),

    // 502 Bad Gateway: the AI provider returned a structurally invalid bank
    MalformedBank(MalformedBank),

    // 422 Unprocessable Entity: submit before every question is answered
    IncompleteAttempt { answered: usize, total: usize },

    // 409 Conflict: mutation of a submitted attempt
    AttemptFinalized,

    // 500 Internal Server Error: the store rejected a read or write
    Persistence(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg) => write!(f, "internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            AppError::AuthError(msg) => write!(f, "unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "conflict: {}", msg),
            AppError::Generation(msg) => write!(f, "generation failed: {}", msg),
            AppError::MalformedBank(err) => write!(f, "malformed question bank: {}", err),
            AppError::IncompleteAttempt { answered, total } => {
                write!(f, "answered {} of {} questions", answered, total)
            }
            AppError::AttemptFinalized => write!(f, "attempt already submitted"),
            AppError::Persistence(msg) => write!(f, "persistence error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Generation(msg) => {
                tracing::warn!("Quiz generation failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to generate the assessment. Please try again.".to_string(),
                )
            }
            AppError::MalformedBank(err) => {
                tracing::warn!("Generator returned a malformed bank: {}", err);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to generate the assessment. Please try again.".to_string(),
                )
            }
            AppError::IncompleteAttempt { answered, total } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!(
                    "Please answer all questions before submitting ({} of {} answered)",
                    answered, total
                ),
            ),
            AppError::AttemptFinalized => {
                tracing::warn!("Mutation attempted on a submitted attempt");
                (
                    StatusCode::CONFLICT,
                    "This attempt has already been submitted".to_string(),
                )
            }
            AppError::Persistence(msg) => {
                tracing::error!("Persistence error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to save".to_string(),
                )
            }
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Malformed(bank) => AppError::MalformedBank(bank),
            other => AppError::Generation(other.to_string()),
        }
    }
}

impl From<AttemptError> for AppError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::IncompleteAttempt { answered, total } => {
                AppError::IncompleteAttempt { answered, total }
            }
            AttemptError::AttemptFinalized => AppError::AttemptFinalized,
            AttemptError::QuestionOutOfRange { .. } | AttemptError::OptionOutOfRange { .. } => {
                AppError::BadRequest(err.to_string())
            }
            AttemptError::NotSubmitted => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound => AppError::NotFound("Attempt not found".to_string()),
            RegistryError::Attempt(err) => err.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
