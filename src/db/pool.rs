//! Database connection pools
//!
//! One trait, two backends. SQLite is the default and suits single-binary
//! deployment; MySQL is available for shared installs. Repositories only see
//! `DynDatabasePool` and downcast to the concrete pool per query.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

const SQLITE_MAX_CONNECTIONS: u32 = 10;
const MYSQL_MAX_CONNECTIONS: u32 = 20;

/// Backend-independent pool handle.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run a statement that returns no rows, yielding the affected count
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Health check
    async fn ping(&self) -> Result<()>;

    /// Close all connections
    async fn close(&self);

    /// Which driver backs this pool
    fn driver(&self) -> DatabaseDriver;

    /// Concrete SQLite pool, if that is the backend
    fn as_sqlite(&self) -> Option<&SqlitePool>;

    /// Concrete MySQL pool, if that is the backend
    fn as_mysql(&self) -> Option<&MySqlPool>;
}

/// Shared pool handle passed around the application
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// SQLite-backed pool
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (and if necessary create) a SQLite database.
    ///
    /// Accepts a bare file path, a `sqlite:` URL, or `:memory:`. For
    /// file-backed databases the parent directory is created first.
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = normalize_sqlite_url(url)?;

        // Foreign keys keep article and comment references valid at the
        // store level; setting them through connect options applies the
        // pragma to every pooled connection.
        let options = SqliteConnectOptions::from_str(&connection_url)
            .with_context(|| format!("Invalid SQLite connection URL: {}", url))?
            .foreign_keys(true);

        // An in-memory database exists per connection, so the pool must not
        // open more than one.
        let max_connections = if connection_url.contains(":memory:") {
            1
        } else {
            SQLITE_MAX_CONNECTIONS
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite database: {}", url))?;

        Ok(Self { pool })
    }

    /// Borrow the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Turn the configured URL into something sqlx accepts, creating the parent
/// directory for file-backed databases.
fn normalize_sqlite_url(url: &str) -> Result<String> {
    if url == ":memory:" || url.starts_with("sqlite::memory:") {
        return Ok("sqlite::memory:".to_string());
    }

    let path = url.strip_prefix("sqlite:").unwrap_or(url);
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }
    }

    if url.starts_with("sqlite:") {
        if url.contains('?') {
            Ok(url.to_string())
        } else {
            Ok(format!("{}?mode=rwc", url))
        }
    } else {
        Ok(format!("sqlite:{}?mode=rwc", url))
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Statement failed: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("SQLite ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        None
    }
}

/// MySQL-backed pool
pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Connect to a MySQL server; the `mysql://` scheme may be omitted in
    /// the configured URL.
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(MYSQL_MAX_CONNECTIONS)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to MySQL database: {}", url))?;

        Ok(Self { pool })
    }

    /// Borrow the underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Statement failed: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("MySQL ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        Some(&self.pool)
    }
}

/// Create the pool named by the configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    match config.driver {
        DatabaseDriver::Sqlite => Ok(Arc::new(SqliteDatabase::new(&config.url).await?)),
        DatabaseDriver::Mysql => Ok(Arc::new(MysqlDatabase::new(&config.url).await?)),
    }
}

/// In-memory SQLite pool for tests
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    let config = DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_pool_is_sqlite() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        assert_eq!(pool.driver(), DatabaseDriver::Sqlite);
        assert!(pool.as_sqlite().is_some());
        assert!(pool.as_mysql().is_none());
    }

    #[tokio::test]
    async fn test_ping_and_execute() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");

        pool.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .await
            .expect("DDL should succeed");
        let affected = pool
            .execute("INSERT INTO t (id) VALUES (1)")
            .await
            .expect("Insert should succeed");
        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        pool.execute("CREATE TABLE parents (id INTEGER PRIMARY KEY)")
            .await
            .expect("DDL failed");
        pool.execute(
            "CREATE TABLE children (id INTEGER PRIMARY KEY, \
             parent_id INTEGER NOT NULL REFERENCES parents(id))",
        )
        .await
        .expect("DDL failed");

        let orphan = pool
            .execute("INSERT INTO children (id, parent_id) VALUES (1, 99)")
            .await;
        assert!(orphan.is_err(), "Dangling reference should be rejected");
    }

    #[tokio::test]
    async fn test_file_pool_creates_parent_directory() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = dir.path().join("nested/deeper/test.db");
        let url = db_path.to_string_lossy().to_string();

        let pool = create_pool(&DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url,
        })
        .await
        .expect("Failed to create file pool");

        pool.ping().await.expect("Ping should succeed");
        assert!(db_path.exists());
        pool.close().await;
    }

    #[test]
    fn test_normalize_sqlite_url_variants() {
        assert_eq!(
            normalize_sqlite_url(":memory:").expect("normalize failed"),
            "sqlite::memory:"
        );
        assert!(normalize_sqlite_url("sqlite:a.db?mode=ro")
            .expect("normalize failed")
            .ends_with("mode=ro"));
        assert_eq!(
            normalize_sqlite_url("a.db").expect("normalize failed"),
            "sqlite:a.db?mode=rwc"
        );
    }

    // Requires a running MySQL server
    #[tokio::test]
    #[ignore]
    async fn test_mysql_pool() {
        let pool = create_pool(&DatabaseConfig {
            driver: DatabaseDriver::Mysql,
            url: "root:password@localhost:3306/devfeed_test".to_string(),
        })
        .await
        .expect("Failed to connect to MySQL");
        pool.ping().await.expect("Ping should succeed");
    }
}
