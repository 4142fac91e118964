//! Shared fixtures for API integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, Response, StatusCode, header};
use etymon_api::config::ApiConfig;
use etymon_api::services::google::IdentityProvider;
use etymon_api::{AppState, router};
use etymon_core::auth::AuthError;
use etymon_core::auth::jwt::issue_token;
use etymon_core::auth::queries;
use etymon_core::models::auth::{ProviderProfile, User};
use tower::ServiceExt;
use url::Url;

pub const SECRET: &str = "integration-test-secret";
pub const CLIENT_URL: &str = "http://client.test";
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Identity provider answering from a fixed code → profile table.
#[derive(Default)]
pub struct StubProvider {
    profiles: HashMap<String, ProviderProfile>,
}

impl StubProvider {
    pub fn with(mut self, code: &str, profile: ProviderProfile) -> Self {
        self.profiles.insert(code.to_string(), profile);
        self
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    fn is_configured(&self) -> bool {
        true
    }

    fn authorization_url(&self, state: &str, code_challenge: &str) -> Result<String, AuthError> {
        Ok(format!(
            "https://accounts.test/auth?state={state}&code_challenge={code_challenge}"
        ))
    }

    async fn exchange_code(
        &self,
        code: &str,
        _code_verifier: &str,
    ) -> Result<ProviderProfile, AuthError> {
        self.profiles
            .get(code)
            .cloned()
            .ok_or_else(|| AuthError::Provider(format!("unknown code {code}")))
    }
}

pub fn profile(subject: &str, email: Option<&str>) -> ProviderProfile {
    ProviderProfile {
        subject: subject.into(),
        email: email.map(str::to_string),
        name: Some("Test User".into()),
        picture: Some("https://example.com/p.png".into()),
    }
}

pub fn test_config() -> ApiConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("JWT_SECRET", SECRET),
        ("ADMIN_EMAILS", ADMIN_EMAIL),
        ("CLIENT_URL", CLIENT_URL),
    ]);
    ApiConfig::from_lookup(move |key| vars.get(key).map(|v| v.to_string()))
}

pub async fn test_state(config: ApiConfig, provider: StubProvider) -> AppState {
    let pool = etymon_core::db::connect_in_memory()
        .await
        .expect("in-memory pool");
    etymon_api::migrate(&pool).await.expect("migrate");
    AppState::new(pool, config, Arc::new(provider))
}

pub async fn default_app() -> (AppState, Router) {
    let state = test_state(test_config(), StubProvider::default()).await;
    let app = router(state.clone());
    (state, app)
}

/// Create a user directly in the store and sign a token for them.
pub async fn user_with_token(state: &AppState, email: &str) -> (User, String) {
    let user = queries::create_user(&state.pool, email, "Someone", "", None)
        .await
        .expect("create user");
    let issued = issue_token(&user, &state.allow_list, &state.config.tokens).expect("issue");
    (user, issued.token)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with(uri: &str, name: header::HeaderName, value: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(name, value)
        .body(Body::empty())
        .unwrap()
}

pub fn bearer(uri: &str, token: &str) -> Request<Body> {
    get_with(uri, header::AUTHORIZATION, &format!("Bearer {token}"))
}

pub fn json_request(method: &str, uri: &str, token: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("request")
}

pub async fn json_body(resp: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("parse JSON")
}

pub async fn status_and_json(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = send(app, req).await;
    let status = resp.status();
    (status, json_body(resp).await)
}

pub fn location(resp: &Response<Body>) -> Url {
    let value = resp
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap();
    Url::parse(value).expect("absolute location")
}

pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// All `Set-Cookie` header values.
pub fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub fn set_cookie_for<'a>(cookies: &'a [String], name: &str) -> Option<&'a String> {
    let prefix = format!("{name}=");
    cookies.iter().find(|c| c.starts_with(&prefix))
}

/// Run the redirect + callback flow for `code`, returning the callback response.
pub async fn login(app: &Router, code: &str) -> Response<Body> {
    let start = send(app, get("/auth/google")).await;
    assert!(start.status().is_redirection());
    let state = query_param(&location(&start), "state").expect("state param");
    send(
        app,
        get(&format!("/auth/google/callback?code={code}&state={state}")),
    )
    .await
}
