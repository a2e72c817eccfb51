//! Article model
//!
//! An article always belongs to exactly one user (its author) and one theme.
//! Both references are NOT NULL foreign keys; an article that cannot resolve
//! either is treated as corrupted data by the content service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Article title
    pub title: String,
    /// Article body
    pub content: String,
    /// Authoring user reference
    pub user_id: i64,
    /// Owning theme reference
    pub theme_id: i64,
    /// Creation timestamp, stamped when the article is accepted
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new article
#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub theme_id: i64,
}
