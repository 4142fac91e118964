//! Login, identity and logout handlers.

use std::time::Duration;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use etymon_core::auth::AuthError;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::middleware::auth::{CurrentUser, MaybeAuth};
use crate::models::{
    AuthConfigStatus, AuthStatusResponse, CallbackParams, CurrentSessionStatus, GoogleOAuthStatus,
    JwtStatus, MeResponse, SessionConfigStatus, SessionUser, SuccessResponse,
};
use crate::services::auth::{LoginOutcome, complete_login, failure_redirect, success_redirect};
use crate::services::cookies::{
    SESSION_COOKIE, clear_session_cookie, clear_token_cookie, session_cookie, token_cookie,
};

/// `GET /auth/google`: redirect to Google's consent screen.
pub async fn google_redirect_handler(State(state): State<AppState>) -> Redirect {
    if !state.provider.is_configured() {
        error!("google login requested but OAuth client credentials are not configured");
        return Redirect::to(&failure_redirect(&state.config.client_url, "server_error"));
    }

    let (oauth_state, challenge) = state.oauth_state.begin();
    match state.provider.authorization_url(&oauth_state, &challenge) {
        Ok(url) => Redirect::to(&url),
        Err(e) => {
            error!(reason = %e, "could not build authorization url");
            state.oauth_state.complete(&oauth_state);
            Redirect::to(&failure_redirect(&state.config.client_url, "server_error"))
        }
    }
}

/// `GET /auth/google/callback`: finish the login and hand the token to the
/// client as a cookie and a redirect parameter. Every failure is a redirect.
pub async fn google_callback_handler(
    State(state): State<AppState>,
    params: Result<Query<CallbackParams>, QueryRejection>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            warn!(reason = %rejection, "malformed callback query");
            return (
                jar,
                Redirect::to(&failure_redirect(&state.config.client_url, "google_auth_failed")),
            );
        }
    };

    let outcome = match finish_callback(&state, params).await {
        Ok(outcome) => outcome,
        Err(code) => {
            return (
                jar,
                Redirect::to(&failure_redirect(&state.config.client_url, code)),
            );
        }
    };

    let LoginOutcome { user, issued } = outcome;
    let max_age = issued.lifetime_secs();
    let session_id = state.sessions.create(
        &user.id,
        &user.email,
        Duration::from_secs(u64::try_from(max_age).unwrap_or_default()),
    );

    let policy = &state.config.cookies;
    let jar = jar
        .add(token_cookie(&issued.token, max_age, policy))
        .add(session_cookie(&session_id, max_age, policy));
    (
        jar,
        Redirect::to(&success_redirect(&state.config.client_url, &issued.token)),
    )
}

/// Run the callback steps, mapping each failure to its redirect code.
async fn finish_callback(
    state: &AppState,
    params: CallbackParams,
) -> Result<LoginOutcome, &'static str> {
    if let Some(provider_error) = params.error {
        warn!(%provider_error, "provider reported a failed authorization");
        return Err("access_denied");
    }

    let pending = params
        .state
        .as_deref()
        .and_then(|s| state.oauth_state.complete(s))
        .ok_or_else(|| {
            warn!("callback with unknown, used or expired state");
            "invalid_state"
        })?;

    let code = params.code.filter(|c| !c.is_empty()).ok_or_else(|| {
        warn!("callback without authorization code");
        "google_auth_failed"
    })?;

    let profile = state
        .provider
        .exchange_code(&code, &pending.pkce_verifier)
        .await
        .map_err(|e| {
            warn!(reason = %e, "authorization code exchange failed");
            e.redirect_code()
        })?;

    complete_login(state, &profile).await.map_err(|e| {
        match &e {
            AuthError::MissingEmail => warn!(subject = %profile.subject, "provider profile has no email"),
            AuthError::MissingSecret => error!("cannot issue token: signing secret not configured"),
            other => error!(reason = %other, "login failed"),
        }
        e.redirect_code()
    })
}

/// `GET /auth/me`: profile of the authenticated user.
pub async fn me_handler(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: user.id,
        email: user.email,
        display_name: user.display_name,
        profile_picture: user.profile_picture,
    })
}

/// `GET /auth/logout`: clear auth cookies and end the server session.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && let Some(session) = state.sessions.get(cookie.value())
    {
        state.sessions.end(cookie.value());
        info!(user_id = %session.user_id, "session ended");
    } else {
        debug!("logout without a server session");
    }

    let policy = &state.config.cookies;
    let jar = jar
        .add(clear_token_cookie(policy))
        .add(clear_session_cookie(policy));
    (jar, Json(SuccessResponse { success: true }))
}

/// `GET /auth/status`: login diagnostics.
pub async fn auth_status_handler(
    State(state): State<AppState>,
    MaybeAuth(auth): MaybeAuth,
    jar: CookieJar,
) -> Json<AuthStatusResponse> {
    let has_server_session = jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.sessions.get(c.value()))
        .is_some();

    Json(AuthStatusResponse {
        status: "ok".into(),
        config: AuthConfigStatus {
            google_oauth: GoogleOAuthStatus {
                client_configured: state.provider.is_configured(),
                callback_url: state.config.google.redirect_uri.clone(),
            },
            jwt: JwtStatus {
                secret_configured: state.config.tokens.has_secret(),
                audience: state.config.tokens.audience.clone(),
                issuer: state.config.tokens.issuer.clone(),
            },
            session: SessionConfigStatus {
                secure: state.config.cookies.production,
            },
        },
        current_session: CurrentSessionStatus {
            is_authenticated: auth.is_some(),
            user_data: auth.map(|ctx| SessionUser {
                id: ctx.user_id().to_string(),
                email: ctx.email().to_string(),
            }),
            has_server_session,
        },
        timestamp: Utc::now(),
    })
}
