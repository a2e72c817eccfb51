//! Article repository
//!
//! Database operations for articles. The per-theme listing preserves store
//! order (ascending id) so the feed concatenation stays deterministic.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Article;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Persist a new article
    async fn create(&self, article: &Article) -> Result<Article>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// List all articles of a theme in store order
    async fn list_by_theme(&self, theme_id: i64) -> Result<Vec<Article>>;
}

/// SQLx-based article repository implementation
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_article_sqlite(self.pool.as_sqlite().unwrap(), article).await
            }
            DatabaseDriver::Mysql => {
                create_article_mysql(self.pool.as_mysql().unwrap(), article).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_article_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_article_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_by_theme(&self, theme_id: i64) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_theme_sqlite(self.pool.as_sqlite().unwrap(), theme_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_theme_mysql(self.pool.as_mysql().unwrap(), theme_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<Article> {
    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, content, user_id, theme_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(article.user_id)
    .bind(article.theme_id)
    .bind(article.created_at)
    .bind(article.updated_at)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_rowid(),
        ..article.clone()
    })
}

async fn get_article_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, content, user_id, theme_id, created_at, updated_at
        FROM articles
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by ID")?;

    Ok(row.map(|row| row_to_article_sqlite(&row)))
}

async fn list_by_theme_sqlite(pool: &SqlitePool, theme_id: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, content, user_id, theme_id, created_at, updated_at
        FROM articles
        WHERE theme_id = ?
        ORDER BY id
        "#,
    )
    .bind(theme_id)
    .fetch_all(pool)
    .await
    .context("Failed to list articles by theme")?;

    Ok(rows.iter().map(row_to_article_sqlite).collect())
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Article {
    Article {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        user_id: row.get("user_id"),
        theme_id: row.get("theme_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(pool: &MySqlPool, article: &Article) -> Result<Article> {
    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, content, user_id, theme_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(article.user_id)
    .bind(article.theme_id)
    .bind(article.created_at)
    .bind(article.updated_at)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_id() as i64,
        ..article.clone()
    })
}

async fn get_article_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, content, user_id, theme_id, created_at, updated_at
        FROM articles
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by ID")?;

    Ok(row.map(|row| row_to_article_mysql(&row)))
}

async fn list_by_theme_mysql(pool: &MySqlPool, theme_id: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, content, user_id, theme_id, created_at, updated_at
        FROM articles
        WHERE theme_id = ?
        ORDER BY id
        "#,
    )
    .bind(theme_id)
    .fetch_all(pool)
    .await
    .context("Failed to list articles by theme")?;

    Ok(rows.iter().map(row_to_article_mysql).collect())
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Article {
    Article {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        user_id: row.get("user_id"),
        theme_id: row.get("theme_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
