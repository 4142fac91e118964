//! OAuth authorization-code support: PKCE, CSRF state and pending logins.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::cache::TtlCache;

/// TTL for pending authorizations (10 minutes).
pub const STATE_TTL: Duration = Duration::from_secs(600);

/// Generate a PKCE code verifier (43 URL-safe chars).
pub fn generate_code_verifier() -> String {
    random_token(32)
}

/// Compute the S256 code challenge for a verifier.
pub fn compute_code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Generate an OAuth `state` parameter (CSRF token).
pub fn generate_state() -> String {
    random_token(24)
}

/// URL-safe random token from `len` bytes of entropy.
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Data kept between the redirect and the callback.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub pkce_verifier: String,
}

/// Pending authorizations keyed by `state`, each usable once.
pub struct OAuthStateStore {
    pending: Arc<TtlCache<String, PendingAuthorization>>,
}

impl OAuthStateStore {
    pub fn new() -> Self {
        Self::with_ttl(STATE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: Arc::new(TtlCache::new(ttl)),
        }
    }

    /// Start an authorization: returns `(state, code_challenge)`.
    pub fn begin(&self) -> (String, String) {
        let state = generate_state();
        let verifier = generate_code_verifier();
        let challenge = compute_code_challenge(&verifier);
        self.pending.insert(
            state.clone(),
            PendingAuthorization {
                pkce_verifier: verifier,
            },
        );
        (state, challenge)
    }

    /// Consume a pending authorization. `None` if unknown, used or expired.
    pub fn complete(&self, state: &str) -> Option<PendingAuthorization> {
        self.pending.take(&state.to_string())
    }

    /// Purge expired pending authorizations every `period` in the background.
    pub fn spawn_cleanup_task(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        self.pending.spawn_cleanup_task(period)
    }
}

impl Default for OAuthStateStore {
    fn default() -> Self {
        Self::new()
    }
}
