//! Schema migrations
//!
//! The schema ships inside the binary as versioned SQL scripts, one variant
//! per backend. Applied versions are recorded in `_migrations` so startup can
//! run only what is pending.

use anyhow::{Context, Result};
use sqlx::Row;

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// One schema step, with a script per backend.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub up_sqlite: &'static str,
    pub up_mysql: &'static str,
}

impl Migration {
    fn script_for(&self, driver: DatabaseDriver) -> &'static str {
        match driver {
            DatabaseDriver::Sqlite => self.up_sqlite,
            DatabaseDriver::Mysql => self.up_mysql,
        }
    }
}

/// The full schema, in apply order.
pub const MIGRATIONS: &[Migration] = &[
    // 1: accounts; username and email are unique at the store level
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'user',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'user',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_users_username ON users(username);
            CREATE INDEX idx_users_email ON users(email);
        "#,
    },
    // 2: themes
    Migration {
        version: 2,
        name: "create_themes",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS themes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS themes (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    // 3: subscriptions are bare membership rows, no join metadata
    Migration {
        version: 3,
        name: "create_subscriptions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS subscriptions (
                user_id INTEGER NOT NULL,
                theme_id INTEGER NOT NULL,
                PRIMARY KEY (user_id, theme_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (theme_id) REFERENCES themes(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_subscriptions_theme_id ON subscriptions(theme_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS subscriptions (
                user_id BIGINT NOT NULL,
                theme_id BIGINT NOT NULL,
                PRIMARY KEY (user_id, theme_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (theme_id) REFERENCES themes(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_subscriptions_theme_id ON subscriptions(theme_id);
        "#,
    },
    // 4: articles; author and theme references are mandatory
    Migration {
        version: 4,
        name: "create_articles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                theme_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (theme_id) REFERENCES themes(id)
            );
            CREATE INDEX IF NOT EXISTS idx_articles_theme_id ON articles(theme_id);
            CREATE INDEX IF NOT EXISTS idx_articles_user_id ON articles(user_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                user_id BIGINT NOT NULL,
                theme_id BIGINT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (theme_id) REFERENCES themes(id)
            );
            CREATE INDEX idx_articles_theme_id ON articles(theme_id);
            CREATE INDEX idx_articles_user_id ON articles(user_id);
        "#,
    },
    // 5: comments keep a write-time copy of the author's username
    Migration {
        version: 5,
        name: "create_comments",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                article_id INTEGER NOT NULL,
                author_name VARCHAR(50) NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_comments_article_id ON comments(article_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                content TEXT NOT NULL,
                user_id BIGINT NOT NULL,
                article_id BIGINT NOT NULL,
                author_name VARCHAR(50) NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_comments_article_id ON comments(article_id);
        "#,
    },
];

/// Bring the schema up to date, returning how many migrations ran.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    ensure_tracking_table(pool).await?;
    let done = applied_versions(pool).await?;

    let mut ran = 0;
    for migration in MIGRATIONS.iter().filter(|m| !done.contains(&m.version)) {
        tracing::info!(version = migration.version, name = migration.name, "applying migration");
        apply(pool, migration)
            .await
            .with_context(|| format!("Migration {} ({}) failed", migration.version, migration.name))?;
        ran += 1;
    }

    if ran > 0 {
        tracing::info!(count = ran, "schema migrated");
    } else {
        tracing::debug!("schema already current");
    }
    Ok(ran)
}

async fn ensure_tracking_table(pool: &DynDatabasePool) -> Result<()> {
    // INTEGER vs INT is the only backend difference here
    let version_type = match pool.driver() {
        DatabaseDriver::Sqlite => "INTEGER",
        DatabaseDriver::Mysql => "INT",
    };
    pool.execute(&format!(
        "CREATE TABLE IF NOT EXISTS _migrations (\
             version {} PRIMARY KEY, \
             name VARCHAR(255) NOT NULL UNIQUE, \
             applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP\
         )",
        version_type
    ))
    .await?;
    Ok(())
}

async fn applied_versions(pool: &DynDatabasePool) -> Result<Vec<i32>> {
    const QUERY: &str = "SELECT version FROM _migrations ORDER BY version";
    let versions = match pool.driver() {
        DatabaseDriver::Sqlite => sqlx::query(QUERY)
            .fetch_all(pool.as_sqlite().unwrap())
            .await?
            .iter()
            .map(|row| row.get::<i32, _>("version"))
            .collect(),
        DatabaseDriver::Mysql => sqlx::query(QUERY)
            .fetch_all(pool.as_mysql().unwrap())
            .await?
            .iter()
            .map(|row| row.get::<i32, _>("version"))
            .collect(),
    };
    Ok(versions)
}

/// Run one migration's statements and record it as applied.
///
/// Statements go through the pool's `execute`, which already dispatches to
/// the right backend, so only the script selection is driver-aware. The
/// recording insert is formatted rather than bound; version and name come
/// from the static migration table above.
async fn apply(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let script = migration.script_for(pool.driver());
    for statement in split_statements(script) {
        pool.execute(&statement)
            .await
            .with_context(|| format!("Statement failed: {}", summarize_sql(&statement)))?;
    }

    pool.execute(&format!(
        "INSERT INTO _migrations (version, name) VALUES ({}, '{}')",
        migration.version, migration.name
    ))
    .await?;
    Ok(())
}

/// sqlx runs one statement per query, so scripts are split on semicolons.
fn split_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collapse whitespace and cap length for error messages.
fn summarize_sql(sql: &str) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(80) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[test]
    fn test_versions_strictly_increase() {
        for pair in MIGRATIONS.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }

    #[test]
    fn test_split_statements_drops_blanks() {
        let parts = split_statements("CREATE TABLE a (id INT);\n CREATE INDEX i ON a(id); \n");
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("CREATE TABLE"));
        assert!(parts[1].starts_with("CREATE INDEX"));
    }

    #[test]
    fn test_summarize_sql_caps_length() {
        let long = "SELECT ".repeat(40);
        let summary = summarize_sql(&long);
        assert!(summary.ends_with("..."));
        assert!(summary.len() <= 84);
    }

    #[tokio::test]
    async fn test_fresh_database_gets_full_schema() {
        let pool = create_test_pool().await.expect("pool");

        let ran = run_migrations(&pool).await.expect("migrations failed");
        assert_eq!(ran, MIGRATIONS.len());

        for table in ["users", "themes", "subscriptions", "articles", "comments"] {
            pool.execute(&format!("SELECT * FROM {} LIMIT 0", table))
                .await
                .unwrap_or_else(|_| panic!("table {} missing", table));
        }
    }

    #[tokio::test]
    async fn test_rerun_is_a_noop() {
        let pool = create_test_pool().await.expect("pool");
        run_migrations(&pool).await.expect("first run failed");
        let second = run_migrations(&pool).await.expect("second run failed");
        assert_eq!(second, 0);
    }
}
