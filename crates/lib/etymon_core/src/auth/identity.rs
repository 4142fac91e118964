//! Identity resolution for a verified provider profile.
//!
//! Lookup order: linked provider id, then email, then a new account.

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::AuthError;
use super::queries;
use crate::models::auth::{ProviderProfile, User};

/// How the local account was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Provider id already linked to an account.
    ProviderMatch,
    /// Existing account with the same email; provider id now linked.
    LinkedByEmail,
    /// No match; a new account was created.
    Created,
}

/// Resolve, link or create the local user for `profile`.
pub async fn resolve_identity(
    pool: &SqlitePool,
    profile: &ProviderProfile,
) -> Result<(User, Resolution), AuthError> {
    let email = profile
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or(AuthError::MissingEmail)?;

    if let Some(resolved) = resolve_existing(pool, profile, email).await? {
        return Ok(resolved);
    }

    let display_name = display_name_for(profile, email);
    let picture = profile.picture.clone().unwrap_or_default();
    match queries::create_user(pool, email, &display_name, &picture, Some(&profile.subject)).await {
        Ok(user) => {
            info!(user_id = %user.id, "created user from provider profile");
            Ok((user, Resolution::Created))
        }
        // A concurrent first login won the insert; resolve against its row.
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            warn!("user insert raced with a concurrent login, retrying as lookup");
            resolve_existing(pool, profile, email)
                .await?
                .ok_or_else(|| AuthError::Internal("user vanished after unique violation".into()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn resolve_existing(
    pool: &SqlitePool,
    profile: &ProviderProfile,
    email: &str,
) -> Result<Option<(User, Resolution)>, AuthError> {
    if let Some(mut user) = queries::find_user_by_google_id(pool, &profile.subject).await? {
        let display_name = display_name_for(profile, &user.email);
        let picture = profile.picture.clone().unwrap_or(user.profile_picture);
        queries::update_profile(pool, &user.id, &display_name, &picture).await?;
        user.display_name = display_name;
        user.profile_picture = picture;
        return Ok(Some((user, Resolution::ProviderMatch)));
    }

    if let Some(mut user) = queries::find_user_by_email(pool, email).await? {
        if let Some(previous) = replaced_provider_id(&user, &profile.subject) {
            warn!(
                user_id = %user.id,
                previous_google_id = %previous,
                new_google_id = %profile.subject,
                "email match replaces a different provider account"
            );
        }
        let display_name = display_name_for(profile, &user.email);
        let picture = profile.picture.clone().unwrap_or(user.profile_picture);
        queries::link_google_account(pool, &user.id, &profile.subject, &display_name, &picture)
            .await?;
        info!(user_id = %user.id, "linked provider account by email");
        user.google_id = Some(profile.subject.clone());
        user.display_name = display_name;
        user.profile_picture = picture;
        return Ok(Some((user, Resolution::LinkedByEmail)));
    }

    Ok(None)
}

/// The user's current provider id when linking `subject` would overwrite it.
fn replaced_provider_id<'a>(user: &'a User, subject: &str) -> Option<&'a str> {
    user.google_id.as_deref().filter(|id| *id != subject)
}

/// Provider display name, falling back to the email's local part.
fn display_name_for(profile: &ProviderProfile, email: &str) -> String {
    profile
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::migrate::migrate;

    async fn pool() -> SqlitePool {
        let pool = connect_in_memory().await.expect("pool");
        migrate(&pool).await.expect("migrate");
        pool
    }

    fn profile(subject: &str, email: Option<&str>) -> ProviderProfile {
        ProviderProfile {
            subject: subject.into(),
            email: email.map(str::to_string),
            name: Some("Alice Liddell".into()),
            picture: Some("https://example.com/a.png".into()),
        }
    }

    #[tokio::test]
    async fn first_login_creates_user() {
        let pool = pool().await;
        let (user, how) = resolve_identity(&pool, &profile("g-1", Some("alice@example.com")))
            .await
            .unwrap();
        assert_eq!(how, Resolution::Created);
        assert_eq!(user.google_id.as_deref(), Some("g-1"));
        assert_ne!(user.id, "g-1");
        assert_eq!(user.display_name, "Alice Liddell");
    }

    #[tokio::test]
    async fn provider_match_updates_profile_and_keeps_id() {
        let pool = pool().await;
        let (first, _) = resolve_identity(&pool, &profile("g-1", Some("alice@example.com")))
            .await
            .unwrap();

        let mut renamed = profile("g-1", Some("alice@example.com"));
        renamed.name = Some("Alice L.".into());
        let (second, how) = resolve_identity(&pool, &renamed).await.unwrap();
        assert_eq!(how, Resolution::ProviderMatch);
        assert_eq!(second.id, first.id);

        let stored = queries::get_user_by_id(&pool, &first.id).await.unwrap().unwrap();
        assert_eq!(stored.display_name, "Alice L.");
    }

    #[tokio::test]
    async fn email_match_links_provider_and_keeps_id() {
        let pool = pool().await;
        let existing = queries::create_user(&pool, "alice@example.com", "alice", "", None)
            .await
            .unwrap();

        let (user, how) = resolve_identity(&pool, &profile("g-9", Some("ALICE@example.com")))
            .await
            .unwrap();
        assert_eq!(how, Resolution::LinkedByEmail);
        assert_eq!(user.id, existing.id);

        let stored = queries::get_user_by_id(&pool, &existing.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.google_id.as_deref(), Some("g-9"));
        assert_eq!(stored.profile_picture, "https://example.com/a.png");
        assert_eq!(queries::list_users(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn email_match_replaces_stale_provider_id() {
        let pool = pool().await;
        let existing = queries::create_user(&pool, "alice@example.com", "alice", "", Some("g-old"))
            .await
            .unwrap();
        assert_eq!(replaced_provider_id(&existing, "g-new"), Some("g-old"));
        assert_eq!(replaced_provider_id(&existing, "g-old"), None);

        let (user, how) = resolve_identity(&pool, &profile("g-new", Some("alice@example.com")))
            .await
            .unwrap();
        assert_eq!(how, Resolution::LinkedByEmail);
        assert_eq!(user.id, existing.id);
        assert_eq!(user.google_id.as_deref(), Some("g-new"));
        assert!(
            queries::find_user_by_google_id(&pool, "g-old")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn missing_email_is_terminal() {
        let pool = pool().await;
        let result = resolve_identity(&pool, &profile("g-1", None)).await;
        assert!(matches!(result, Err(AuthError::MissingEmail)));
        let blank = resolve_identity(&pool, &profile("g-1", Some("  "))).await;
        assert!(matches!(blank, Err(AuthError::MissingEmail)));
        assert!(queries::list_users(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn display_name_falls_back_to_email_local_part() {
        let pool = pool().await;
        let mut anonymous = profile("g-2", Some("bob@example.com"));
        anonymous.name = None;
        anonymous.picture = None;
        let (user, _) = resolve_identity(&pool, &anonymous).await.unwrap();
        assert_eq!(user.display_name, "bob");
        assert_eq!(user.profile_picture, "");
    }
}
