//! Integration tests for token extraction, verification and logout.

mod common;

use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};
use common::*;
use etymon_core::auth::jwt::issue_token_at;
use etymon_core::auth::queries;

#[tokio::test]
async fn me_accepts_header_cookie_and_query() {
    let (state, app) = default_app().await;
    let (user, token) = user_with_token(&state, "alice@example.com").await;

    let requests = [
        bearer("/auth/me", &token),
        get_with("/auth/me", header::COOKIE, &format!("token={token}")),
        get(&format!("/auth/me?token={token}")),
    ];
    for req in requests {
        let (status, json) = status_and_json(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], user.id.as_str());
        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("display_name").is_some());
        assert!(json.get("profile_picture").is_some());
        assert!(json.get("role").is_none());
        assert!(json.get("permissions").is_none());
    }
}

#[tokio::test]
async fn missing_invalid_and_expired_are_distinct() {
    let (state, app) = default_app().await;

    let (status, json) = status_and_json(&app, get("/auth/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "not_authenticated");

    let (status, json) = status_and_json(&app, bearer("/auth/me", "not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "token_invalid");

    let user = queries::create_user(&state.pool, "old@example.com", "Old", "", None)
        .await
        .unwrap();
    let stale = issue_token_at(
        &user,
        &state.allow_list,
        &state.config.tokens,
        Utc::now() - Duration::days(2),
    )
    .unwrap();
    let (status, json) = status_and_json(&app, bearer("/auth/me", &stale.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "token_expired");
}

#[tokio::test]
async fn header_takes_precedence_over_cookie() {
    let (state, app) = default_app().await;
    let (_, token) = user_with_token(&state, "alice@example.com").await;

    let req = axum::http::Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::COOKIE, "token=garbage")
        .body(axum::body::Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::OK);

    // A bad header is not rescued by a good cookie.
    let req = axum::http::Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, "Bearer garbage")
        .header(header::COOKIE, format!("token={token}"))
        .body(axum::body::Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_from_another_deployment_is_rejected() {
    let (state, app) = default_app().await;
    let user = queries::create_user(&state.pool, "alice@example.com", "Alice", "", None)
        .await
        .unwrap();

    let mut foreign = state.config.tokens.clone();
    foreign.audience = "someone-else".into();
    let token = etymon_core::auth::jwt::issue_token(&user, &state.allow_list, &foreign)
        .unwrap()
        .token;
    let (status, json) = status_and_json(&app, bearer("/auth/me", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "token_invalid");
}

#[tokio::test]
async fn deleted_user_token_is_unauthenticated() {
    let (state, app) = default_app().await;
    let (user, token) = user_with_token(&state, "alice@example.com").await;
    queries::delete_user(&state.pool, &user.id).await.unwrap();

    let (status, json) = status_and_json(&app, bearer("/auth/me", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "not_authenticated");
}

#[tokio::test]
async fn missing_secret_is_server_misconfiguration() {
    let mut config = test_config();
    config.tokens.secret = None;
    let state = test_state(config, StubProvider::default()).await;
    let app = etymon_api::router(state);

    let (status, json) = status_and_json(&app, bearer("/auth/me", "any.token.value")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "server_misconfigured");
}

#[tokio::test]
async fn logout_clears_cookie_and_is_idempotent() {
    let (state, app) = default_app().await;
    let (_, token) = user_with_token(&state, "alice@example.com").await;

    let resp = send(
        &app,
        get_with("/auth/logout", header::COOKIE, &format!("token={token}")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookies = set_cookies(resp.headers());
    let cleared = set_cookie_for(&cookies, "token").expect("token cookie cleared");
    assert!(cleared.starts_with("token=;") || cleared.starts_with("token=\"\""));
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(json_body(resp).await["success"], true);

    // The browser now only holds the cleared (empty) cookie.
    let (status, json) = status_and_json(&app, get_with("/auth/me", header::COOKIE, "token=")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "not_authenticated");

    let (status, json) = status_and_json(&app, get("/auth/logout")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
}

#[tokio::test]
async fn logout_ends_the_server_session() {
    let state = test_state(
        test_config(),
        StubProvider::default().with("c1", profile("g-1", Some("alice@example.com"))),
    )
    .await;
    let app = etymon_api::router(state.clone());

    let resp = login(&app, "c1").await;
    let cookies = set_cookies(resp.headers());
    let session_pair = set_cookie_for(&cookies, "etymon_session")
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let session_id = session_pair.trim_start_matches("etymon_session=").to_string();
    assert!(state.sessions.get(&session_id).is_some());

    let (_, json) = status_and_json(
        &app,
        get_with("/auth/status", header::COOKIE, &session_pair),
    )
    .await;
    assert_eq!(json["currentSession"]["hasServerSession"], true);

    send(&app, get_with("/auth/logout", header::COOKIE, &session_pair)).await;
    assert!(state.sessions.get(&session_id).is_none());
}
