//! Public content handlers.

use axum::Json;
use axum::extract::State;
use etymon_core::content;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::MaybeAuth;
use crate::models::{ArticleListResponse, Viewer};

/// `GET /articles/summary`: article listing; names the viewer when a valid
/// token was sent.
pub async fn articles_summary_handler(
    State(state): State<AppState>,
    MaybeAuth(auth): MaybeAuth,
) -> AppResult<Json<ArticleListResponse>> {
    let articles = content::list_summaries(&state.pool).await?;
    Ok(Json(ArticleListResponse {
        articles,
        viewer: auth.map(|ctx| Viewer {
            id: ctx.user_id().to_string(),
            role: ctx.role(),
        }),
    }))
}
