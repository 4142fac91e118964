//! Authentication middleware: token extraction, verification and identity
//! context.
//!
//! Tokens are looked up in the `Authorization: Bearer` header, then the
//! `token` cookie, then the `token` query parameter. The first non-empty one
//! is the only one verified.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Uri, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use etymon_core::auth::AuthError;
use etymon_core::auth::jwt::verify_token;
use etymon_core::auth::permissions::{Permissions, Role};
use etymon_core::auth::queries;
use etymon_core::models::auth::{TokenClaims, User};
use tracing::{debug, error, warn};

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::TOKEN_COOKIE;

/// Where the verified token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Header,
    Cookie,
    Query,
}

/// Find the request's token by precedence. Empty values count as absent.
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<(String, TokenSource)> {
    bearer_token(headers)
        .map(|t| (t, TokenSource::Header))
        .or_else(|| cookie_token(headers).map(|t| (t, TokenSource::Cookie)))
        .or_else(|| query_token(uri).map(|t| (t, TokenSource::Query)))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

fn query_token(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty())
}

/// Verified identity attached to the request.
///
/// Built from token claims only. `require_admin` swaps it for an elevated copy
/// once the allow-list confirms the caller.
#[derive(Clone)]
pub struct AuthContext {
    claims: TokenClaims,
    role: Role,
    permissions: Permissions,
    source: TokenSource,
}

impl AuthContext {
    pub fn new(claims: TokenClaims, source: TokenSource) -> Self {
        Self {
            role: claims.role,
            permissions: claims.permissions,
            claims,
            source,
        }
    }

    /// Copy of this context with admin role and every permission.
    pub fn verified_admin(&self) -> Self {
        Self {
            role: Role::Admin,
            permissions: Permissions::all(),
            ..self.clone()
        }
    }

    pub fn user_id(&self) -> &str {
        &self.claims.id
    }

    pub fn email(&self) -> &str {
        &self.claims.email
    }

    /// Effective role: the token's, or admin once verified.
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    /// Claims exactly as they were signed.
    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    pub fn source(&self) -> TokenSource {
        self.source
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("user_id", &self.claims.id)
            .field("role", &self.role)
            .field("permissions", &self.permissions)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("Not authenticated".into()))
    }
}

/// Identity for routes where authentication is optional.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AuthContext>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(parts.extensions.get::<AuthContext>().cloned()))
    }
}

/// Stored account of the authenticated caller, set by [`check_user_exists`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("Not authenticated".into()))
    }
}

fn verify_request(state: &AppState, headers: &HeaderMap, uri: &Uri) -> Result<AuthContext, AuthError> {
    let (token, source) = extract_token(headers, uri).ok_or(AuthError::MissingToken)?;
    let claims = verify_token(&token, &state.config.tokens)?;
    Ok(AuthContext::new(claims, source))
}

/// Require a valid token and attach its [`AuthContext`].
///
/// Missing, invalid and expired tokens are all 401 with distinct error codes.
/// A missing signing secret is a 500.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match verify_request(&state, request.headers(), request.uri()) {
        Ok(ctx) => {
            debug!(user_id = %ctx.user_id(), source = ?ctx.source(), "authenticated request");
            request.extensions_mut().insert(ctx);
            Ok(next.run(request).await)
        }
        Err(e) => {
            let route = request.uri().path();
            match &e {
                AuthError::MissingSecret => {
                    error!(route, "token verification impossible: signing secret not configured");
                }
                AuthError::MissingToken => debug!(route, "request without token"),
                other => warn!(route, reason = %other, "token rejected"),
            }
            Err(e.into())
        }
    }
}

/// Attach an [`AuthContext`] when a valid token is present. Never rejects.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match verify_request(&state, request.headers(), request.uri()) {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
        }
        Err(AuthError::MissingToken) => {}
        Err(AuthError::MissingSecret) => {
            error!(
                route = request.uri().path(),
                "optional auth skipped: signing secret not configured"
            );
        }
        Err(e) => debug!(route = request.uri().path(), reason = %e, "ignoring unusable token"),
    }
    next.run(request).await
}

/// Confirm the authenticated caller still has an account and attach it as
/// [`CurrentUser`]. Must run after [`authenticate`].
pub async fn check_user_exists(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = request
        .extensions()
        .get::<AuthContext>()
        .map(|ctx| ctx.user_id().to_string())
        .ok_or_else(|| AppError::Unauthenticated("Not authenticated".into()))?;

    let user = queries::get_user_by_id(&state.pool, &user_id)
        .await?
        .ok_or_else(|| {
            warn!(%user_id, "token subject no longer exists");
            AppError::Unauthenticated("User no longer exists".into())
        })?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
