//! Theme repository
//!
//! Database operations for themes. Themes are created once and never updated,
//! so the interface is create/get/list only.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Theme;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Theme repository trait
#[async_trait]
pub trait ThemeRepository: Send + Sync {
    /// Create a new theme
    async fn create(&self, theme: &Theme) -> Result<Theme>;

    /// Get theme by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Theme>>;

    /// List all themes in creation order
    async fn list(&self) -> Result<Vec<Theme>>;
}

/// SQLx-based theme repository implementation
pub struct SqlxThemeRepository {
    pool: DynDatabasePool,
}

impl SqlxThemeRepository {
    /// Create a new SQLx theme repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ThemeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ThemeRepository for SqlxThemeRepository {
    async fn create(&self, theme: &Theme) -> Result<Theme> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_theme_sqlite(self.pool.as_sqlite().unwrap(), theme).await
            }
            DatabaseDriver::Mysql => create_theme_mysql(self.pool.as_mysql().unwrap(), theme).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Theme>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_theme_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_theme_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Theme>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_themes_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_themes_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_theme_sqlite(pool: &SqlitePool, theme: &Theme) -> Result<Theme> {
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO themes (title, description, created_at) VALUES (?, ?, ?)",
    )
    .bind(&theme.title)
    .bind(&theme.description)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create theme")?;

    Ok(Theme {
        id: result.last_insert_rowid(),
        title: theme.title.clone(),
        description: theme.description.clone(),
        created_at: now,
    })
}

async fn get_theme_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Theme>> {
    let row = sqlx::query("SELECT id, title, description, created_at FROM themes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get theme by ID")?;

    Ok(row.map(|row| row_to_theme_sqlite(&row)))
}

async fn list_themes_sqlite(pool: &SqlitePool) -> Result<Vec<Theme>> {
    let rows = sqlx::query("SELECT id, title, description, created_at FROM themes ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list themes")?;

    Ok(rows.iter().map(row_to_theme_sqlite).collect())
}

fn row_to_theme_sqlite(row: &sqlx::sqlite::SqliteRow) -> Theme {
    Theme {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_theme_mysql(pool: &MySqlPool, theme: &Theme) -> Result<Theme> {
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO themes (title, description, created_at) VALUES (?, ?, ?)",
    )
    .bind(&theme.title)
    .bind(&theme.description)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create theme")?;

    Ok(Theme {
        id: result.last_insert_id() as i64,
        title: theme.title.clone(),
        description: theme.description.clone(),
        created_at: now,
    })
}

async fn get_theme_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Theme>> {
    let row = sqlx::query("SELECT id, title, description, created_at FROM themes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get theme by ID")?;

    Ok(row.map(|row| row_to_theme_mysql(&row)))
}

async fn list_themes_mysql(pool: &MySqlPool) -> Result<Vec<Theme>> {
    let rows = sqlx::query("SELECT id, title, description, created_at FROM themes ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list themes")?;

    Ok(rows.iter().map(row_to_theme_mysql).collect())
}

fn row_to_theme_mysql(row: &sqlx::mysql::MySqlRow) -> Theme {
    Theme {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}
