use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::validation::FieldErrors;

#[derive(Debug)]
pub enum AppError {
    Validation(FieldErrors),
    InvalidCredentials,
    InvalidOrExpiredToken,
    UserNotFound,
    InvalidToken(String),
    Unauthorized(String),
    Internal(String),
    Database(sqlx::Error),
    Cache(redis::RedisError),
}

impl AppError {
    /// Shorthand for a validation failure on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        AppError::Validation(errors)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation failed: {errors}"),
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::InvalidOrExpiredToken => write!(f, "Invalid or expired reset token"),
            AppError::UserNotFound => write!(f, "User not found"),
            AppError::InvalidToken(msg) => write!(f, "Invalid Token: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
            AppError::Cache(err) => write!(f, "Cache Error: {err}"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, axum::Json(errors)).into_response();
            }
            AppError::InvalidCredentials => {
                let errors = FieldErrors::non_field("Invalid credentials");
                return (StatusCode::BAD_REQUEST, axum::Json(errors)).into_response();
            }
            AppError::InvalidOrExpiredToken => (
                StatusCode::BAD_REQUEST,
                "Invalid or expired reset token".to_string(),
            ),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AppError::InvalidToken(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Cache(err) => {
                tracing::error!("Cache error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(FieldErrors::non_field(rejection.body_text()))
    }
}
