//! Access token issuance and verification (HS256).

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::AuthError;
use super::allow_list::AdminAllowList;
use super::permissions::{Permissions, Role};
use crate::models::auth::{TokenClaims, User};
use crate::uuid::new_token_id;

/// Signing and validation parameters shared by issuer and verifier.
#[derive(Clone)]
pub struct TokenSettings {
    /// HS256 signing secret. `None` means the deployment is misconfigured.
    pub secret: Option<String>,
    pub audience: String,
    pub issuer: String,
}

impl TokenSettings {
    fn secret_bytes(&self) -> Result<&[u8], AuthError> {
        match self.secret.as_deref() {
            Some(s) if !s.is_empty() => Ok(s.as_bytes()),
            _ => Err(AuthError::MissingSecret),
        }
    }

    /// Whether a usable signing secret is configured.
    pub fn has_secret(&self) -> bool {
        self.secret_bytes().is_ok()
    }
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// A freshly signed token and its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Seconds until expiry, counted from issuance.
    pub fn lifetime_secs(&self) -> i64 {
        self.claims.exp - self.claims.iat
    }
}

/// Issue a token for `user`, deriving role and permissions from the allow-list.
pub fn issue_token(
    user: &User,
    allow_list: &AdminAllowList,
    settings: &TokenSettings,
) -> Result<IssuedToken, AuthError> {
    issue_token_at(user, allow_list, settings, Utc::now())
}

/// Same as [`issue_token`] with an explicit issuance time.
pub fn issue_token_at(
    user: &User,
    allow_list: &AdminAllowList,
    settings: &TokenSettings,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthError> {
    let secret = settings.secret_bytes()?;

    let role = Role::from_admin(allow_list.is_admin(&user.email));
    let expires_at = now + role.token_lifetime();
    let claims = TokenClaims {
        id: user.id.clone(),
        email: user.email.clone(),
        name: user.display_name.clone(),
        role,
        permissions: Permissions::for_role(role),
        jti: new_token_id(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        aud: settings.audience.clone(),
        iss: settings.issuer.clone(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))?;

    debug!(user_id = %user.id, %role, jti = %claims.jti, "issued access token");
    Ok(IssuedToken {
        token,
        claims,
        expires_at,
    })
}

/// Verify signature, expiry, audience and issuer, returning the claims.
pub fn verify_token(token: &str, settings: &TokenSettings) -> Result<TokenClaims, AuthError> {
    let secret = settings.secret_bytes()?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_audience(&[settings.audience.as_str()]);
    validation.set_issuer(&[settings.issuer.as_str()]);
    validation.set_required_spec_claims(&["exp", "aud", "iss"]);

    let claims = decode::<TokenClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidAudience => AuthError::InvalidToken("invalid audience".into()),
            ErrorKind::InvalidIssuer => AuthError::InvalidToken("invalid issuer".into()),
            ErrorKind::InvalidSignature => AuthError::InvalidToken("invalid signature".into()),
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

    // The library only rejects `exp < now`; a token is dead from `exp` onward.
    if Utc::now().timestamp() >= claims.exp {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}
