//! API error handling
//!
//! [`AppError`] is the handler boundary: every domain failure is mapped to
//! exactly one status code and body here.

use crate::auth::middleware::NOT_AUTHORIZED;
use crate::validation::FieldViolation;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flix_core::FlixError;
use serde::{Deserialize, Serialize};

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new("NOT_FOUND", format!("{resource} not found"))
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Body of a 422 response
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationErrorBody {
    pub errors: Vec<FieldViolation>,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    UsernameTaken(String),
    Unauthorized(String),
    Forbidden,
    Validation(Vec<FieldViolation>),
    Internal(String),
    Database(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::not_found(&msg)),
            AppError::UsernameTaken(username) => (
                StatusCode::BAD_REQUEST,
                ApiError::new(
                    "USERNAME_TAKEN",
                    FlixError::UsernameTaken(username).to_string(),
                ),
            ),
            AppError::Unauthorized(reason) => {
                let body = serde_json::json!({
                    "error": reason,
                    "status": StatusCode::UNAUTHORIZED.as_u16(),
                });
                return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
            }
            AppError::Forbidden => {
                return (StatusCode::FORBIDDEN, Json(NOT_AUTHORIZED)).into_response();
            }
            AppError::Validation(errors) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ValidationErrorBody { errors }),
                )
                    .into_response();
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal_error().with_details(msg),
            ),
            AppError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("DATABASE_ERROR", "Database operation failed").with_details(msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Background task failed: {err}"))
    }
}

impl From<FlixError> for AppError {
    fn from(err: FlixError) -> Self {
        match err {
            FlixError::NotFound(msg) => AppError::NotFound(msg),
            FlixError::UsernameTaken(username) => AppError::UsernameTaken(username),
            FlixError::DatabaseError(msg) => AppError::Database(msg),
            FlixError::ConfigError(msg) => AppError::Internal(format!("Configuration error: {msg}")),
            FlixError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}
