//! Application error types.
//!
//! Every error leaves the process as a fixed `{error, code}` body; store and
//! internal details are logged and never sent to the client.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use meshauth_core::auth::secret::SecretError;
use meshauth_core::auth::{AuthError, PolicyError};
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;
use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "already_exists", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", "Invalid token"),
            AppError::StoreUnavailable(detail) => {
                error!(detail = %detail, "user store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "Service unavailable",
                )
            }
            AppError::Internal(detail) => {
                error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
        });
        if status == StatusCode::UNAUTHORIZED {
            (status, [(WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::ValidationError(msg) => AppError::Validation(msg),
            AuthError::AlreadyExists => AppError::Conflict("User already exists".into()),
            AuthError::InvalidCredentials => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::Denied(_) => AppError::InvalidToken,
            AuthError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Unreadable request bodies share the validation shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Failures that stop the server before it serves traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to initialize auth service: {0}")]
    Auth(#[from] AuthError),
}
