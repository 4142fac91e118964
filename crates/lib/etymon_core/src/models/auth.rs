//! Authentication domain models.
//!
//! These are internal domain models, distinct from API response models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::permissions::{Permissions, Role};

/// A federated user identity as stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Opaque, locally generated identifier.
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub profile_picture: String,
    /// Google subject id, once linked.
    pub google_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Verified profile returned by the identity provider after the code exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Provider subject id (Google `sub`).
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// JWT claims embedded in access tokens.
///
/// Every field is required; a payload missing any of them fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Local user id.
    pub id: String,
    pub email: String,
    /// Display name.
    pub name: String,
    pub role: Role,
    pub permissions: Permissions,
    /// Unique token identifier.
    pub jti: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
    pub aud: String,
    pub iss: String,
}
