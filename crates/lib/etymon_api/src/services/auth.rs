//! Login completion: identity resolution, token issuance and client redirects.

use etymon_core::auth::AuthError;
use etymon_core::auth::identity::resolve_identity;
use etymon_core::auth::jwt::{IssuedToken, issue_token};
use etymon_core::models::auth::{ProviderProfile, User};
use tracing::info;

use crate::AppState;
use crate::routes;

/// Result of a successful federated login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub issued: IssuedToken,
}

/// Resolve the local account for `profile` and sign its access token.
pub async fn complete_login(
    state: &AppState,
    profile: &ProviderProfile,
) -> Result<LoginOutcome, AuthError> {
    let (user, resolution) = resolve_identity(&state.pool, profile).await?;
    let issued = issue_token(&user, &state.allow_list, &state.config.tokens)?;
    info!(
        user_id = %user.id,
        role = %issued.claims.role,
        resolution = ?resolution,
        "login completed"
    );
    Ok(LoginOutcome { user, issued })
}

/// Client URL for `path` with URL-encoded query parameters.
pub fn client_redirect(client_url: &str, path: &str, params: &[(&str, &str)]) -> String {
    let base = client_url.trim_end_matches('/');
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{base}{path}?{query}")
}

/// Post-login redirect carrying the fresh token.
pub fn success_redirect(client_url: &str, token: &str) -> String {
    client_redirect(client_url, routes::CLIENT_AUTH_CALLBACK, &[("token", token)])
}

/// Login-page redirect carrying a failure code.
pub fn failure_redirect(client_url: &str, code: &str) -> String {
    client_redirect(client_url, routes::CLIENT_LOGIN, &[("error", code)])
}
