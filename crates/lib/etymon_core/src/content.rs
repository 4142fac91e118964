//! Article content store used by the admin-gated endpoints.

use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::content::{ArticleInput, ArticleSummary};

/// Content errors.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Article {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// Check required fields and that at least one level is present.
pub fn validate(article: &ArticleInput) -> Result<(), ContentError> {
    let missing: Vec<&str> = [
        ("title", article.title.trim().is_empty()),
        ("article_link", article.article_link.trim().is_empty()),
        ("summary", article.summary.trim().is_empty()),
        ("created_date", article.created_date.trim().is_empty()),
    ]
    .into_iter()
    .filter_map(|(name, empty)| empty.then_some(name))
    .collect();
    if !missing.is_empty() {
        return Err(ContentError::Validation(format!(
            "missing article fields: {}",
            missing.join(", ")
        )));
    }
    if article.levels.is_empty() {
        return Err(ContentError::Validation("no content levels provided".into()));
    }
    Ok(())
}

fn levels_json(article: &ArticleInput) -> Result<String, ContentError> {
    serde_json::to_string(&article.levels)
        .map_err(|e| ContentError::Validation(format!("levels: {e}")))
}

/// Insert an article, returning its id.
pub async fn insert_article(pool: &SqlitePool, article: &ArticleInput) -> Result<i64, ContentError> {
    validate(article)?;
    let levels = levels_json(article)?;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO articles (title, article_link, summary, created_date, levels) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&article.title)
    .bind(&article.article_link)
    .bind(&article.summary)
    .bind(&article.created_date)
    .bind(levels)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Replace an article's content.
pub async fn update_article(
    pool: &SqlitePool,
    id: i64,
    article: &ArticleInput,
) -> Result<(), ContentError> {
    validate(article)?;
    let levels = levels_json(article)?;
    let result = sqlx::query(
        "UPDATE articles SET title = ?, article_link = ?, summary = ?, created_date = ?, levels = ? \
         WHERE id = ?",
    )
    .bind(&article.title)
    .bind(&article.article_link)
    .bind(&article.summary)
    .bind(&article.created_date)
    .bind(levels)
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ContentError::NotFound(id));
    }
    Ok(())
}

/// Delete an article.
pub async fn delete_article(pool: &SqlitePool, id: i64) -> Result<(), ContentError> {
    let result = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ContentError::NotFound(id));
    }
    Ok(())
}

/// List article summaries, newest first.
pub async fn list_summaries(pool: &SqlitePool) -> Result<Vec<ArticleSummary>, ContentError> {
    let rows = sqlx::query_as::<_, ArticleSummary>(
        "SELECT id, title, article_link, summary, created_date FROM articles ORDER BY id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
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

    fn article(title: &str) -> ArticleInput {
        let mut levels = serde_json::Map::new();
        levels.insert(
            "beginner".into(),
            serde_json::json!({ "text": { "content": "Hello", "phonetics": "" } }),
        );
        ArticleInput {
            title: title.into(),
            article_link: "https://example.com/a".into(),
            summary: "A story".into(),
            created_date: "2024-05-01".into(),
            levels,
        }
    }

    #[test]
    fn validation_names_missing_fields() {
        let err = validate(&ArticleInput::default()).unwrap_err();
        let msg = err.to_string();
        for field in ["title", "article_link", "summary", "created_date"] {
            assert!(msg.contains(field), "{msg}");
        }
    }

    #[test]
    fn validation_requires_levels() {
        let mut input = article("A");
        input.levels.clear();
        assert!(matches!(validate(&input), Err(ContentError::Validation(_))));
    }

    #[tokio::test]
    async fn insert_update_delete() {
        let pool = pool().await;
        let id = insert_article(&pool, &article("First")).await.unwrap();
        update_article(&pool, id, &article("Renamed")).await.unwrap();
        let rows = list_summaries(&pool).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Renamed");
        delete_article(&pool, id).await.unwrap();
        assert!(list_summaries(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_article_is_not_found() {
        let pool = pool().await;
        assert!(matches!(
            update_article(&pool, 42, &article("x")).await,
            Err(ContentError::NotFound(42))
        ));
        assert!(matches!(
            delete_article(&pool, 42).await,
            Err(ContentError::NotFound(42))
        ));
    }
}
