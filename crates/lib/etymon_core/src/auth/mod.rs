//! Authentication and authorization logic.
//!
//! Admin status comes from the configured allow-list only. Role and
//! permissions are derived from it when a token is issued, and `etymon_api`
//! re-derives them for admin-gated requests.

pub mod allow_list;
pub mod identity;
pub mod jwt;
pub mod oauth;
pub mod permissions;
pub mod queries;
pub mod session;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not authenticated")]
    MissingToken,

    #[error("token invalid: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("token signing secret is not configured")]
    MissingSecret,

    #[error("identity provider returned no email")]
    MissingEmail,

    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Error code carried in the login-failure redirect.
    pub fn redirect_code(&self) -> &'static str {
        match self {
            AuthError::MissingEmail => "missing_email",
            AuthError::Provider(_) => "google_auth_failed",
            _ => "server_error",
        }
    }
}
