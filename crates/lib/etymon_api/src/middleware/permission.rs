//! Authorization middleware: permission gates and admin verification.
//!
//! Both expect [`authenticate`](super::auth::authenticate) to have run first.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use etymon_core::auth::permissions::{Permission, Role};
use etymon_core::auth::queries;
use tracing::{info, warn};

use super::auth::AuthContext;
use crate::AppState;
use crate::error::AppError;

/// Allow the request only if the caller's context grants `permission`.
///
/// Usage: `from_fn_with_state(Permission::WriteContent, require_permission)`.
pub async fn require_permission(
    State(permission): State<Permission>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let route = request.uri().path().to_string();
    let Some(ctx) = request.extensions().get::<AuthContext>() else {
        warn!(%route, %permission, "permission check on unauthenticated request");
        return Err(AppError::Unauthenticated("Not authenticated".into()));
    };

    if !ctx.permissions().grants(permission) {
        warn!(
            user_id = %ctx.user_id(),
            %route,
            %permission,
            "permission denied"
        );
        return Err(AppError::Forbidden(format!("Missing permission: {permission}")));
    }

    Ok(next.run(request).await)
}

/// Allow the request only if the token was signed with the admin role and the
/// caller's stored email is still on the admin allow-list.
///
/// A user-role token is refused even after its owner is allow-listed; only a
/// fresh login yields an admin token. On success the context is replaced with
/// an elevated copy holding every permission.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let route = request.uri().path().to_string();
    let ctx = request
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or_else(|| AppError::Unauthenticated("Not authenticated".into()))?;

    if ctx.claims().role != Role::Admin {
        warn!(
            user_id = %ctx.user_id(),
            token_role = %ctx.claims().role,
            %route,
            "admin access denied: token not issued as admin"
        );
        return Err(AppError::Forbidden(
            "Admin token required, log in again".into(),
        ));
    }

    let user = queries::get_user_by_id(&state.pool, ctx.user_id())
        .await?
        .ok_or_else(|| {
            warn!(user_id = %ctx.user_id(), %route, "admin check for unknown user");
            AppError::Unauthenticated("User no longer exists".into())
        })?;

    if !state.allow_list.is_admin(&user.email) {
        warn!(
            user_id = %user.id,
            token_role = %ctx.role(),
            %route,
            "admin access denied"
        );
        return Err(AppError::Forbidden("Admin access required".into()));
    }

    info!(user_id = %user.id, %route, "admin access granted");
    request.extensions_mut().insert(ctx.verified_admin());
    Ok(next.run(request).await)
}
