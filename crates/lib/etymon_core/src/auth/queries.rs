//! Identity store queries.

use chrono::Utc;
use sqlx::SqlitePool;

use super::AuthError;
use crate::models::auth::User;
use crate::uuid::new_user_id;

const USER_COLUMNS: &str = "id, email, display_name, profile_picture, google_id, created_at";

/// Fetch a user by local id.
pub async fn get_user_by_id(pool: &SqlitePool, user_id: &str) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Fetch a user by linked Google subject id.
pub async fn find_user_by_google_id(
    pool: &SqlitePool,
    google_id: &str,
) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE google_id = ?"
    ))
    .bind(google_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Fetch a user by email (case-insensitive via the column collation).
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// List all users, oldest first.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, AuthError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Insert a new user with a freshly generated id.
///
/// Fails with a unique violation if the email or Google id is already taken.
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    display_name: &str,
    profile_picture: &str,
    google_id: Option<&str>,
) -> Result<User, sqlx::Error> {
    let user = User {
        id: new_user_id(),
        email: email.trim().to_string(),
        display_name: display_name.to_string(),
        profile_picture: profile_picture.to_string(),
        google_id: google_id.map(str::to_string),
        created_at: Utc::now(),
    };
    sqlx::query(
        "INSERT INTO users (id, email, display_name, profile_picture, google_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.display_name)
    .bind(&user.profile_picture)
    .bind(&user.google_id)
    .bind(user.created_at)
    .execute(pool)
    .await?;
    Ok(user)
}

/// Refresh display name and picture.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    display_name: &str,
    profile_picture: &str,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET display_name = ?, profile_picture = ? WHERE id = ?")
        .bind(display_name)
        .bind(profile_picture)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Link a Google subject id to an existing account and refresh its profile.
pub async fn link_google_account(
    pool: &SqlitePool,
    user_id: &str,
    google_id: &str,
    display_name: &str,
    profile_picture: &str,
) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE users SET google_id = ?, display_name = ?, profile_picture = ? WHERE id = ?",
    )
    .bind(google_id)
    .bind(display_name)
    .bind(profile_picture)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a user. Only used by administrative tooling and tests.
pub async fn delete_user(pool: &SqlitePool, user_id: &str) -> Result<bool, AuthError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
