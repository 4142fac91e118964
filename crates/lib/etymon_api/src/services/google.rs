//! Google OAuth 2.0 identity provider.
//!
//! The callback handler only sees the [`IdentityProvider`] trait, so tests can
//! stand in a provider that never leaves the process.

use std::time::Duration;

use async_trait::async_trait;
use etymon_core::auth::AuthError;
use etymon_core::models::auth::ProviderProfile;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::GoogleConfig;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Scopes requested at login.
pub const SCOPES: &str = "openid profile email";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// An external OAuth identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Whether client credentials are present.
    fn is_configured(&self) -> bool;

    /// Consent-screen URL carrying `state` and the PKCE challenge.
    fn authorization_url(&self, state: &str, code_challenge: &str) -> Result<String, AuthError>;

    /// Exchange an authorization code for the user's verified profile.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<ProviderProfile, AuthError>;
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

/// Google implementation of [`IdentityProvider`].
pub struct GoogleIdentityProvider {
    config: GoogleConfig,
    http: reqwest::Client,
    token_url: String,
    userinfo_url: String,
}

impl GoogleIdentityProvider {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }

    async fn fetch_access_token(&self, code: &str, code_verifier: &str) -> Result<String, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];

        let resp = self
            .http
            .post(&self.token_url)
            .timeout(HTTP_TIMEOUT)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("token exchange failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!(
                "token exchange HTTP {status}: {body}"
            )));
        }

        resp.json::<GoogleTokenResponse>()
            .await
            .map(|t| t.access_token)
            .map_err(|e| AuthError::Provider(format!("token response parse error: {e}")))
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleUserInfo, AuthError> {
        let resp = self
            .http
            .get(&self.userinfo_url)
            .timeout(HTTP_TIMEOUT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("userinfo request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AuthError::Provider(format!(
                "userinfo HTTP {}",
                resp.status()
            )));
        }

        resp.json::<GoogleUserInfo>()
            .await
            .map_err(|e| AuthError::Provider(format!("userinfo parse error: {e}")))
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn authorization_url(&self, state: &str, code_challenge: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| AuthError::Internal(format!("authorization url: {e}")))?;
        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<ProviderProfile, AuthError> {
        let access_token = self.fetch_access_token(code, code_verifier).await?;
        let info = self.fetch_userinfo(&access_token).await?;
        debug!(sub = %info.sub, "fetched google profile");
        profile_from_userinfo(info)
    }
}

fn profile_from_userinfo(info: GoogleUserInfo) -> Result<ProviderProfile, AuthError> {
    if info.email.is_some() && info.email_verified == Some(false) {
        return Err(AuthError::Provider("google email is not verified".into()));
    }
    Ok(ProviderProfile {
        subject: info.sub,
        email: info.email,
        name: info.name,
        picture: info.picture,
    })
}
