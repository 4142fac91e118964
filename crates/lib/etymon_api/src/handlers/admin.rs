//! Admin-only handlers. Every route here sits behind `require_admin` and a
//! permission gate.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use etymon_core::auth::permissions::Role;
use etymon_core::auth::queries;
use etymon_core::content;
use etymon_core::models::content::ArticleInput;
use tracing::info;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthContext;
use crate::models::{
    AdminIdentity, AdminStatusResponse, AdminUser, AdminUsersResponse, ContentCreatedResponse,
    SuccessResponse,
};

/// `GET /admin/status`
pub async fn admin_status_handler(ctx: AuthContext) -> Json<AdminStatusResponse> {
    Json(AdminStatusResponse {
        success: true,
        message: "Admin access verified".into(),
        timestamp: Utc::now(),
        user: AdminIdentity {
            id: ctx.user_id().to_string(),
            email: ctx.email().to_string(),
            role: ctx.role(),
        },
    })
}

/// `GET /admin/users`: every user, with the role the allow-list grants now.
pub async fn list_users_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> AppResult<Json<AdminUsersResponse>> {
    let users = queries::list_users(&state.pool)
        .await?
        .into_iter()
        .map(|u| AdminUser {
            role: Role::from_admin(state.allow_list.is_admin(&u.email)),
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            created_at: u.created_at,
        })
        .collect::<Vec<_>>();
    info!(user_id = %ctx.user_id(), count = users.len(), "admin listed users");
    Ok(Json(AdminUsersResponse {
        success: true,
        users,
    }))
}

/// `POST /admin/content`
pub async fn create_content_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<ArticleInput>,
) -> AppResult<(StatusCode, Json<ContentCreatedResponse>)> {
    let article_id = content::insert_article(&state.pool, &body).await?;
    info!(user_id = %ctx.user_id(), article_id, "article created");
    Ok((
        StatusCode::CREATED,
        Json(ContentCreatedResponse {
            success: true,
            article_id,
        }),
    ))
}

/// `PUT /admin/content/{id}`
pub async fn update_content_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<i64>,
    Json(body): Json<ArticleInput>,
) -> AppResult<Json<SuccessResponse>> {
    content::update_article(&state.pool, id, &body).await?;
    info!(user_id = %ctx.user_id(), article_id = id, "article updated");
    Ok(Json(SuccessResponse { success: true }))
}

/// `DELETE /admin/content/{id}`
pub async fn delete_content_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    content::delete_article(&state.pool, id).await?;
    info!(user_id = %ctx.user_id(), article_id = id, "article deleted");
    Ok(Json(SuccessResponse { success: true }))
}
