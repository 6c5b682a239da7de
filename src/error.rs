//! Application error type. Every service returns `AppError`; axum turns it
//! into exactly one JSON response `{"error": <code>, "message": <text>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    auth::{jwt::TokenError, password::PasswordError},
    store::StoreError,
};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("missing or malformed Authorization header")]
    MissingToken,

    #[error("invalid or expired token")]
    InvalidToken,

    /// Same message for unknown email and wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Also returned when the task exists but belongs to another user.
    #[error("task not found")]
    NotFound,

    #[error("email already registered")]
    DuplicateUser,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingToken | AppError::InvalidToken | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::DuplicateUser => StatusCode::CONFLICT,
            AppError::Configuration(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::MissingToken => "unauthorized",
            AppError::InvalidToken => "invalid_token",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::NotFound => "not_found",
            AppError::DuplicateUser => "duplicate_user",
            AppError::Configuration(_) => "configuration_error",
            AppError::Storage(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(anyhow::anyhow!(err))
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MissingSecret => {
                AppError::Configuration("JWT_SECRET is not configured".into())
            }
            TokenError::Invalid(_) => AppError::InvalidToken,
            TokenError::Encode(e) => AppError::Internal(anyhow::anyhow!("sign token: {e}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            // details stay in the logs
            error!(error = %self, code = self.code(), "request failed");
            match &self {
                AppError::Configuration(_) => "server is misconfigured".to_string(),
                _ => "internal server error".to_string(),
            }
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error: self.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
