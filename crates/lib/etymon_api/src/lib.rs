//! # etymon_api
//!
//! HTTP API library for Etymon authentication.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use etymon_core::auth::allow_list::AdminAllowList;
use etymon_core::auth::oauth::OAuthStateStore;
use etymon_core::auth::permissions::Permission;
use etymon_core::auth::session::SessionStore;
use sqlx::SqlitePool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, content, health};
use crate::middleware::auth::{authenticate, check_user_exists, optional_auth};
use crate::middleware::permission::{require_admin, require_permission};
use crate::middleware::security::with_security_headers;
use crate::services::google::IdentityProvider;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool.
    pub pool: SqlitePool,
    /// API configuration.
    pub config: ApiConfig,
    /// Admin emails, parsed once from configuration.
    pub allow_list: Arc<AdminAllowList>,
    pub provider: Arc<dyn IdentityProvider>,
    /// Pending OAuth authorizations keyed by `state`.
    pub oauth_state: Arc<OAuthStateStore>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: ApiConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        let allow_list = Arc::new(AdminAllowList::from_csv(&config.admin_emails));
        Self {
            pool,
            config,
            allow_list,
            provider,
            oauth_state: Arc::new(OAuthStateStore::new()),
            sessions: Arc::new(SessionStore::new()),
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `etymon_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    etymon_core::migrate::migrate(pool).await
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(%origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    // Public routes (no auth)
    let public = Router::new()
        .route(routes::GET_HEALTH, get(health::health_handler))
        .route(routes::GET_AUTH_GOOGLE, get(auth::google_redirect_handler))
        .route(
            routes::GET_AUTH_GOOGLE_CALLBACK,
            get(auth::google_callback_handler),
        )
        .route(routes::GET_AUTH_LOGOUT, get(auth::logout_handler));

    // Optional auth: identity attached when a valid token is present
    let optional = Router::new()
        .route(routes::GET_AUTH_STATUS, get(auth::auth_status_handler))
        .route(
            routes::GET_ARTICLES_SUMMARY,
            get(content::articles_summary_handler),
        )
        .route_layer(from_fn_with_state(state.clone(), optional_auth));

    // Authenticated routes backed by a live account
    let authenticated = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .route_layer(from_fn_with_state(state.clone(), check_user_exists))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    // Admin routes: authenticate, then require_admin, then the route's permission
    let admin = Router::new()
        .route(
            routes::GET_ADMIN_STATUS,
            get(admin::admin_status_handler).layer(from_fn_with_state(
                Permission::ManageSystem,
                require_permission,
            )),
        )
        .route(
            routes::GET_ADMIN_USERS,
            get(admin::list_users_handler).layer(from_fn_with_state(
                Permission::ManageUsers,
                require_permission,
            )),
        )
        .route(
            routes::POST_ADMIN_CONTENT,
            post(admin::create_content_handler).layer(from_fn_with_state(
                Permission::WriteContent,
                require_permission,
            )),
        )
        .route(
            routes::ADMIN_CONTENT_ID,
            put(admin::update_content_handler)
                .delete(admin::delete_content_handler)
                .layer(from_fn_with_state(
                    Permission::WriteContent,
                    require_permission,
                )),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    let production = state.config.cookies.production;
    let cors = cors_layer(&state.config);

    let app = public
        .merge(optional)
        .merge(authenticated)
        .merge(admin)
        .layer(cors)
        .with_state(state);

    if production {
        with_security_headers(app)
    } else {
        app
    }
}
