//! Theme service
//!
//! Theme catalog operations. Thin by design; subscription membership is
//! handled by the profile service.

use crate::db::repositories::ThemeRepository;
use crate::models::Theme;
use crate::services::content::ContentError;
use std::sync::Arc;

/// Theme service for listing and creating themes
pub struct ThemeService {
    themes: Arc<dyn ThemeRepository>,
}

impl ThemeService {
    /// Create a new theme service
    pub fn new(themes: Arc<dyn ThemeRepository>) -> Self {
        Self { themes }
    }

    /// List all themes in creation order
    pub async fn list(&self) -> Result<Vec<Theme>, ContentError> {
        Ok(self.themes.list().await?)
    }

    /// Get a theme by ID
    pub async fn get(&self, id: i64) -> Result<Theme, ContentError> {
        self.themes
            .get_by_id(id)
            .await?
            .ok_or(ContentError::NotFound)
    }

    /// Create a new theme
    pub async fn create(&self, title: String, description: String) -> Result<Theme, ContentError> {
        if title.trim().is_empty() {
            return Err(ContentError::Validation("Title cannot be empty".into()));
        }

        let theme = self.themes.create(&Theme::new(title, description)).await?;
        tracing::info!(theme_id = theme.id, "theme created");
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxThemeRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> ThemeService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ThemeService::new(SqlxThemeRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let service = setup().await;

        service
            .create("Rust".to_string(), "Systems programming".to_string())
            .await
            .expect("create failed");
        service
            .create("Go".to_string(), String::new())
            .await
            .expect("create failed");

        let themes = service.list().await.expect("list failed");
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].title, "Rust");
        assert_eq!(themes[1].title, "Go");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let service = setup().await;
        let result = service.create("  ".to_string(), String::new()).await;
        assert!(matches!(result, Err(ContentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let service = setup().await;
        let result = service.get(999).await;
        assert!(matches!(result, Err(ContentError::NotFound)));
    }
}
