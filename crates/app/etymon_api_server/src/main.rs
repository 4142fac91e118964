//! Etymon authentication API server binary.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use etymon_api::config::ApiConfig;
use etymon_api::services::google::GoogleIdentityProvider;
use tracing::{error, info, warn};

const DEFAULT_LOG_FILTER: &str = "info,etymon_api=debug,etymon_core=debug";

/// How often expired OAuth states and sessions are evicted.
const CACHE_CLEANUP_PERIOD: Duration = Duration::from_secs(60);

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "etymon_api_server", about = "Etymon authentication API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    bind_addr: String,

    /// SQLite connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://etymon.db")]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    config.bind_addr = args.bind_addr;
    config.database_url = args.database_url;

    info!(
        database_url = %config.database_url,
        bind_addr = %config.bind_addr,
        production = config.cookies.production,
        "starting etymon_api_server"
    );
    if !config.tokens.has_secret() {
        error!("JWT_SECRET is not set: logins and authenticated requests will fail");
    }
    if !config.google.is_configured() {
        warn!("GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET not set: Google login disabled");
    }

    let pool = etymon_core::db::connect(&config.database_url, args.max_connections).await?;

    info!("running database migrations");
    etymon_api::migrate(&pool).await?;

    let provider = Arc::new(GoogleIdentityProvider::new(config.google.clone()));
    let state = etymon_api::AppState::new(pool, config.clone(), provider);
    info!(admins = state.allow_list.len(), "admin allow-list loaded");

    let state_cleanup = state.oauth_state.spawn_cleanup_task(CACHE_CLEANUP_PERIOD);
    let session_cleanup = state.sessions.spawn_cleanup_task(CACHE_CLEANUP_PERIOD);

    let app = etymon_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state_cleanup.abort();
    session_cleanup.abort();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
