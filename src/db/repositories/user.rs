//! User repository
//!
//! Database operations for users and their theme subscriptions. The
//! subscription set belongs to the user aggregate, so membership operations
//! live here rather than on the theme repository.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Theme, User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update a user
    async fn update(&self, user: &User) -> Result<User>;

    /// Count total users
    async fn count(&self) -> Result<i64>;

    /// List the themes a user is subscribed to, resolved to full rows
    async fn subscribed_themes(&self, user_id: i64) -> Result<Vec<Theme>>;

    /// Check whether a membership exists
    async fn is_subscribed(&self, user_id: i64, theme_id: i64) -> Result<bool>;

    /// Add a (user, theme) membership
    async fn add_subscription(&self, user_id: i64, theme_id: i64) -> Result<()>;

    /// Remove a (user, theme) membership
    async fn remove_subscription(&self, user_id: i64, theme_id: i64) -> Result<()>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => create_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_sqlite(self.pool.as_sqlite().unwrap(), "id", &id.to_string()).await
            }
            DatabaseDriver::Mysql => {
                get_user_mysql(self.pool.as_mysql().unwrap(), "id", &id.to_string()).await
            }
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_sqlite(self.pool.as_sqlite().unwrap(), "username", username).await
            }
            DatabaseDriver::Mysql => {
                get_user_mysql(self.pool.as_mysql().unwrap(), "username", username).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_sqlite(self.pool.as_sqlite().unwrap(), "email", email).await
            }
            DatabaseDriver::Mysql => {
                get_user_mysql(self.pool.as_mysql().unwrap(), "email", email).await
            }
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => update_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query("SELECT COUNT(*) as count FROM users")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to count users")?;
                Ok(row.get("count"))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query("SELECT COUNT(*) as count FROM users")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to count users")?;
                Ok(row.get("count"))
            }
        }
    }

    async fn subscribed_themes(&self, user_id: i64) -> Result<Vec<Theme>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                subscribed_themes_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                subscribed_themes_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn is_subscribed(&self, user_id: i64, theme_id: i64) -> Result<bool> {
        let sql = "SELECT COUNT(*) as count FROM subscriptions WHERE user_id = ? AND theme_id = ?";
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(user_id)
                .bind(theme_id)
                .fetch_one(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to check subscription")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(user_id)
                .bind(theme_id)
                .fetch_one(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to check subscription")?
                .get("count"),
        };
        Ok(count > 0)
    }

    async fn add_subscription(&self, user_id: i64, theme_id: i64) -> Result<()> {
        let sql = "INSERT INTO subscriptions (user_id, theme_id) VALUES (?, ?)";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(user_id)
                    .bind(theme_id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to add subscription")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(user_id)
                    .bind(theme_id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to add subscription")?;
            }
        }
        Ok(())
    }

    async fn remove_subscription(&self, user_id: i64, theme_id: i64) -> Result<()> {
        let sql = "DELETE FROM subscriptions WHERE user_id = ? AND theme_id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(user_id)
                    .bind(theme_id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to remove subscription")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(user_id)
                    .bind(theme_id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to remove subscription")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();
    let role_str = user.role.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&role_str)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_rowid();

    Ok(User {
        id,
        username: user.username.clone(),
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        role: user.role,
        created_at: now,
        updated_at: now,
    })
}

async fn get_user_sqlite(pool: &SqlitePool, column: &str, value: &str) -> Result<Option<User>> {
    // column is always one of "id", "username", "email"
    let sql = format!(
        "SELECT id, username, email, password_hash, role, created_at, updated_at \
         FROM users WHERE {} = ?",
        column
    );

    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get user by {}", column))?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();
    let role_str = user.role.to_string();

    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, password_hash = ?, role = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&role_str)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_sqlite(pool, "id", &user.id.to_string())
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn subscribed_themes_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Vec<Theme>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.title, t.description, t.created_at
        FROM themes t
        INNER JOIN subscriptions s ON s.theme_id = t.id
        WHERE s.user_id = ?
        ORDER BY t.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list subscribed themes")?;

    let mut themes = Vec::new();
    for row in rows {
        themes.push(Theme {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            created_at: row.get("created_at"),
        });
    }

    Ok(themes)
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();
    let role_str = user.role.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&role_str)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_id() as i64;

    Ok(User {
        id,
        username: user.username.clone(),
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        role: user.role,
        created_at: now,
        updated_at: now,
    })
}

async fn get_user_mysql(pool: &MySqlPool, column: &str, value: &str) -> Result<Option<User>> {
    let sql = format!(
        "SELECT id, username, email, password_hash, role, created_at, updated_at \
         FROM users WHERE {} = ?",
        column
    );

    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get user by {}", column))?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();
    let role_str = user.role.to_string();

    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, password_hash = ?, role = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&role_str)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_mysql(pool, "id", &user.id.to_string())
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn subscribed_themes_mysql(pool: &MySqlPool, user_id: i64) -> Result<Vec<Theme>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.title, t.description, t.created_at
        FROM themes t
        INNER JOIN subscriptions s ON s.theme_id = t.id
        WHERE s.user_id = ?
        ORDER BY t.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list subscribed themes")?;

    let mut themes = Vec::new();
    for row in rows {
        themes.push(Theme {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            created_at: row.get("created_at"),
        });
    }

    Ok(themes)
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::theme::{SqlxThemeRepository, ThemeRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::hash_password;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn test_user(username: &str, email: &str) -> User {
        User::new(
            username.to_string(),
            email.to_string(),
            hash_password("Passw0rd!").expect("Failed to hash password"),
            UserRole::User,
        )
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&test_user("alice", "alice@example.com"))
            .await
            .expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.username, "alice");
        assert_eq!(created.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&test_user("alice", "alice@example.com"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(found.username, "alice");

        assert!(repo.get_by_id(999).await.expect("query failed").is_none());
    }

    #[tokio::test]
    async fn test_get_by_username_and_email() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("bob", "bob@example.com"))
            .await
            .expect("Failed to create user");

        let by_name = repo
            .get_by_username("bob")
            .await
            .expect("query failed")
            .expect("User not found");
        assert_eq!(by_name.email, "bob@example.com");

        let by_email = repo
            .get_by_email("bob@example.com")
            .await
            .expect("query failed")
            .expect("User not found");
        assert_eq!(by_email.username, "bob");

        assert!(repo
            .get_by_username("nobody")
            .await
            .expect("query failed")
            .is_none());
    }

    #[tokio::test]
    async fn test_update_user() {
        let (_pool, repo) = setup_test_repo().await;
        let mut created = repo
            .create(&test_user("carol", "carol@example.com"))
            .await
            .expect("Failed to create user");

        created.username = "caroline".to_string();
        created.email = "caroline@example.com".to_string();

        let updated = repo.update(&created).await.expect("Failed to update user");
        assert_eq!(updated.username, "caroline");
        assert_eq!(updated.email, "caroline@example.com");
        assert!(updated.updated_at >= created.created_at);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("dup", "dup@example.com"))
            .await
            .expect("Failed to create first user");

        let same_name = repo.create(&test_user("dup", "other@example.com")).await;
        assert!(same_name.is_err(), "Duplicate username should fail");

        let same_email = repo.create(&test_user("other", "dup@example.com")).await;
        assert!(same_email.is_err(), "Duplicate email should fail");
    }

    #[tokio::test]
    async fn test_count() {
        let (_pool, repo) = setup_test_repo().await;
        assert_eq!(repo.count().await.expect("count failed"), 0);

        repo.create(&test_user("u1", "u1@example.com"))
            .await
            .expect("create failed");
        repo.create(&test_user("u2", "u2@example.com"))
            .await
            .expect("create failed");

        assert_eq!(repo.count().await.expect("count failed"), 2);
    }

    #[tokio::test]
    async fn test_subscription_membership() {
        let (pool, repo) = setup_test_repo().await;
        let theme_repo = SqlxThemeRepository::new(pool.clone());

        let user = repo
            .create(&test_user("dave", "dave@example.com"))
            .await
            .expect("create failed");
        let theme = theme_repo
            .create(&Theme::new("Rust".to_string(), "Systems".to_string()))
            .await
            .expect("create theme failed");

        assert!(!repo
            .is_subscribed(user.id, theme.id)
            .await
            .expect("check failed"));

        repo.add_subscription(user.id, theme.id)
            .await
            .expect("subscribe failed");
        assert!(repo
            .is_subscribed(user.id, theme.id)
            .await
            .expect("check failed"));

        let themes = repo
            .subscribed_themes(user.id)
            .await
            .expect("list failed");
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].title, "Rust");

        repo.remove_subscription(user.id, theme.id)
            .await
            .expect("unsubscribe failed");
        assert!(repo
            .subscribed_themes(user.id)
            .await
            .expect("list failed")
            .is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_subscription_rejected_by_store() {
        let (pool, repo) = setup_test_repo().await;
        let theme_repo = SqlxThemeRepository::new(pool.clone());

        let user = repo
            .create(&test_user("erin", "erin@example.com"))
            .await
            .expect("create failed");
        let theme = theme_repo
            .create(&Theme::new("Go".to_string(), String::new()))
            .await
            .expect("create theme failed");

        repo.add_subscription(user.id, theme.id)
            .await
            .expect("subscribe failed");
        let dup = repo.add_subscription(user.id, theme.id).await;
        assert!(dup.is_err(), "Composite primary key should reject duplicates");
    }
}
