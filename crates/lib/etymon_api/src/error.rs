//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use etymon_core::auth::AuthError;
use etymon_core::content::ContentError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// No credential presented, or the account behind it is gone.
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Server misconfigured: {0}")]
    Misconfigured(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthenticated(_) => "not_authenticated",
            AppError::InvalidToken(_) => "token_invalid",
            AppError::TokenExpired => "token_expired",
            AppError::Forbidden(_) => "forbidden",
            AppError::Misconfigured(_) => "server_misconfigured",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated(_) | AppError::InvalidToken(_) | AppError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Misconfigured(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Validation(m)
            | AppError::NotFound(m)
            | AppError::Unauthenticated(m)
            | AppError::InvalidToken(m)
            | AppError::Forbidden(m) => m.clone(),
            AppError::TokenExpired => "Token expired".to_string(),
            AppError::Misconfigured(detail) => {
                error!(%detail, "server misconfigured");
                "Server misconfigured".to_string()
            }
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                "Internal server error".to_string()
            }
        };
        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            message,
        });
        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken => AppError::Unauthenticated("Not authenticated".into()),
            AuthError::InvalidToken(msg) => AppError::InvalidToken(msg),
            AuthError::TokenExpired => AppError::TokenExpired,
            AuthError::MissingSecret => AppError::Misconfigured(e.to_string()),
            AuthError::MissingEmail => AppError::Validation(e.to_string()),
            AuthError::Provider(msg) => AppError::Internal(msg),
            AuthError::DbError(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<ContentError> for AppError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::Validation(msg) => AppError::Validation(msg),
            ContentError::NotFound(id) => AppError::NotFound(format!("Article {id} not found")),
            ContentError::DbError(e) => AppError::from(e),
        }
    }
}
