//! Comment model
//!
//! Comments reference a user and an article. The `author_name` field is a
//! write-time snapshot of the author's username so historical display names
//! survive a later rename; it is never recomputed from the user row.

use serde::{Deserialize, Serialize};

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: i64,
    /// Comment body
    pub content: String,
    /// Authoring user reference
    pub user_id: i64,
    /// Owning article reference
    pub article_id: i64,
    /// Snapshot of the author's username at write time
    pub author_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_serializes_snapshot_name() {
        let comment = Comment {
            id: 1,
            content: "Nice read".to_string(),
            user_id: 1,
            article_id: 2,
            author_name: "alice".to_string(),
        };

        let json = serde_json::to_value(&comment).expect("Failed to serialize");
        assert_eq!(json["author_name"], "alice");
    }
}
