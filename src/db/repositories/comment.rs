//! Comment repository
//!
//! Database operations for comments. The author display name is stored on
//! each row at write time, so reads never join back to users.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Comment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Persist a new comment
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// List all comments of an article in store order
    async fn list_by_article(&self, article_id: i64) -> Result<Vec<Comment>>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    /// Create a new SQLx comment repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_comment_sqlite(self.pool.as_sqlite().unwrap(), comment).await
            }
            DatabaseDriver::Mysql => {
                create_comment_mysql(self.pool.as_mysql().unwrap(), comment).await
            }
        }
    }

    async fn list_by_article(&self, article_id: i64) -> Result<Vec<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_article_sqlite(self.pool.as_sqlite().unwrap(), article_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_article_mysql(self.pool.as_mysql().unwrap(), article_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(pool: &SqlitePool, comment: &Comment) -> Result<Comment> {
    let result = sqlx::query(
        r#"
        INSERT INTO comments (content, user_id, article_id, author_name)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&comment.content)
    .bind(comment.user_id)
    .bind(comment.article_id)
    .bind(&comment.author_name)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        ..comment.clone()
    })
}

async fn list_by_article_sqlite(pool: &SqlitePool, article_id: i64) -> Result<Vec<Comment>> {
    let rows = sqlx::query(
        r#"
        SELECT id, content, user_id, article_id, author_name
        FROM comments
        WHERE article_id = ?
        ORDER BY id
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to list comments by article")?;

    Ok(rows.iter().map(row_to_comment_sqlite).collect())
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        content: row.get("content"),
        user_id: row.get("user_id"),
        article_id: row.get("article_id"),
        author_name: row.get("author_name"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(pool: &MySqlPool, comment: &Comment) -> Result<Comment> {
    let result = sqlx::query(
        r#"
        INSERT INTO comments (content, user_id, article_id, author_name)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&comment.content)
    .bind(comment.user_id)
    .bind(comment.article_id)
    .bind(&comment.author_name)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        ..comment.clone()
    })
}

async fn list_by_article_mysql(pool: &MySqlPool, article_id: i64) -> Result<Vec<Comment>> {
    let rows = sqlx::query(
        r#"
        SELECT id, content, user_id, article_id, author_name
        FROM comments
        WHERE article_id = ?
        ORDER BY id
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to list comments by article")?;

    Ok(rows.iter().map(row_to_comment_mysql).collect())
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Comment {
    Comment {
        id: row.get("id"),
        content: row.get("content"),
        user_id: row.get("user_id"),
        article_id: row.get("article_id"),
        author_name: row.get("author_name"),
    }
}
