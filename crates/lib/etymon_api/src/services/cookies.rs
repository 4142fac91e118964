//! Cookie service: set and clear the httpOnly auth cookies.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

use crate::config::CookiePolicy;

/// Cookie name for the access token.
pub const TOKEN_COOKIE: &str = "token";
/// Cookie name for the server-side session id.
pub const SESSION_COOKIE: &str = "etymon_session";

fn base(name: &str, value: &str, policy: &CookiePolicy) -> Cookie<'static> {
    let same_site = if policy.production {
        SameSite::None
    } else {
        SameSite::Lax
    };
    let mut cookie = Cookie::build((name.to_string(), value.to_string()))
        .http_only(true)
        .secure(policy.production)
        .same_site(same_site)
        .path("/".to_string())
        .build();
    if let Some(domain) = &policy.domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

/// Access token cookie, living exactly as long as the token.
pub fn token_cookie(token: &str, max_age_secs: i64, policy: &CookiePolicy) -> Cookie<'static> {
    let mut cookie = base(TOKEN_COOKIE, token, policy);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie
}

pub fn session_cookie(session_id: &str, max_age_secs: i64, policy: &CookiePolicy) -> Cookie<'static> {
    let mut cookie = base(SESSION_COOKIE, session_id, policy);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie
}

/// Expired token cookie with the same attributes it was set with.
pub fn clear_token_cookie(policy: &CookiePolicy) -> Cookie<'static> {
    expired(TOKEN_COOKIE, policy)
}

pub fn clear_session_cookie(policy: &CookiePolicy) -> Cookie<'static> {
    expired(SESSION_COOKIE, policy)
}

fn expired(name: &str, policy: &CookiePolicy) -> Cookie<'static> {
    let mut cookie = base(name, "", policy);
    cookie.set_max_age(Duration::ZERO);
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
    cookie
}
