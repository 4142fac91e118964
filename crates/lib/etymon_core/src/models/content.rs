//! Article content models.

use serde::{Deserialize, Serialize};

/// Article payload accepted by the admin content endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub article_link: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub created_date: String,
    /// Level key → level content. Stored as-is.
    #[serde(default)]
    pub levels: serde_json::Map<String, serde_json::Value>,
}

/// Article listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub article_link: String,
    pub summary: String,
    pub created_date: String,
}
