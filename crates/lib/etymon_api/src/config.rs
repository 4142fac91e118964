//! API server configuration.

use etymon_core::auth::jwt::TokenSettings;

use crate::routes;

/// Google OAuth client settings.
#[derive(Clone, Default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL registered with Google.
    pub redirect_uri: String,
}

impl GoogleConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Cookie flags that depend on the deployment environment.
#[derive(Clone, Debug, Default)]
pub struct CookiePolicy {
    /// Production: `Secure` cookies with `SameSite=None`. Otherwise `Lax`.
    pub production: bool,
    pub domain: Option<String>,
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// SQLite connection URL.
    pub database_url: String,
    /// Token signing and validation parameters.
    pub tokens: TokenSettings,
    /// Comma-separated admin emails.
    pub admin_emails: String,
    /// Client base URL for post-login redirects.
    pub client_url: String,
    /// Extra CORS origins besides the client URL.
    pub cors_origins: Vec<String>,
    /// Public base URL of this server.
    pub server_url: String,
    pub google: GoogleConfig,
    pub cookies: CookiePolicy,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                | Default                      |
    /// |-------------------------|------------------------------|
    /// | `BIND_ADDR`             | `127.0.0.1:3000`             |
    /// | `DATABASE_URL`          | `sqlite://etymon.db`         |
    /// | `JWT_SECRET`            | none                         |
    /// | `JWT_AUDIENCE`          | `etymon-app`                 |
    /// | `JWT_ISSUER`            | `etymon-auth-service`        |
    /// | `ADMIN_EMAILS`          | `EMAIL_ADM`, else empty      |
    /// | `CLIENT_URL`            | `http://localhost:4200`      |
    /// | `CORS_ORIGINS`          | empty                        |
    /// | `SERVER_URL`            | `http://localhost:3000`      |
    /// | `GOOGLE_CLIENT_ID`      | empty                        |
    /// | `GOOGLE_CLIENT_SECRET`  | empty                        |
    /// | `APP_ENV`               | non-production               |
    /// | `COOKIE_DOMAIN`         | none                         |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let server_url = or("SERVER_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();
        let redirect_uri = format!("{server_url}{}", routes::GET_AUTH_GOOGLE_CALLBACK);

        Self {
            bind_addr: or("BIND_ADDR", "127.0.0.1:3000"),
            database_url: or("DATABASE_URL", "sqlite://etymon.db"),
            tokens: TokenSettings {
                secret: var("JWT_SECRET"),
                audience: or("JWT_AUDIENCE", "etymon-app"),
                issuer: or("JWT_ISSUER", "etymon-auth-service"),
            },
            admin_emails: var("ADMIN_EMAILS")
                .or_else(|| var("EMAIL_ADM"))
                .unwrap_or_default(),
            client_url: or("CLIENT_URL", "http://localhost:4200")
                .trim_end_matches('/')
                .to_string(),
            cors_origins: var("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().trim_end_matches('/').to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            server_url,
            google: GoogleConfig {
                client_id: var("GOOGLE_CLIENT_ID").unwrap_or_default(),
                client_secret: var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
                redirect_uri,
            },
            cookies: CookiePolicy {
                production: var("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production")),
                domain: var("COOKIE_DOMAIN"),
            },
        }
    }

    /// Origins allowed by CORS: the client URL plus any extras.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![self.client_url.clone()];
        for origin in &self.cors_origins {
            if !origins.contains(origin) {
                origins.push(origin.clone());
            }
        }
        origins
    }
}
