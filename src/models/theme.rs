//! Theme model
//!
//! A theme is a topical category that articles belong to. Users subscribe to
//! themes to curate their article feed. Themes are created by an
//! administrative action and are immutable afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Theme entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    /// Unique identifier
    pub id: i64,
    /// Theme title
    pub title: String,
    /// Theme description
    pub description: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Theme {
    /// Create a new Theme; the id is assigned by the database.
    pub fn new(title: String, description: String) -> Self {
        Self {
            id: 0,
            title,
            description,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_new() {
        let theme = Theme::new("Rust".to_string(), "Systems programming".to_string());
        assert_eq!(theme.id, 0);
        assert_eq!(theme.title, "Rust");
        assert_eq!(theme.description, "Systems programming");
    }
}
