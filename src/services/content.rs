//! Content service
//!
//! Article and comment access. Article reads are denormalized into views that
//! carry the author's username and the theme title. A dangling reference
//! aborts the feed rather than producing a partial result; on a single
//! article read it makes the article unavailable.

use crate::db::repositories::{
    ArticleRepository, CommentRepository, ThemeRepository, UserRepository,
};
use crate::models::{Article, Comment, NewArticle, User};
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Error types for content operations
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity not found
    #[error("Not found")]
    NotFound,

    /// A stored reference points at a missing row
    #[error("Inconsistent data: {0}")]
    InconsistentData(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// An article denormalized for reading
#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub theme_id: i64,
    pub theme_title: String,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

/// A single article with its comment thread
#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: ArticleView,
    pub comments: Vec<Comment>,
}

/// Content service for articles and comments
pub struct ContentService {
    users: Arc<dyn UserRepository>,
    themes: Arc<dyn ThemeRepository>,
    articles: Arc<dyn ArticleRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl ContentService {
    /// Create a new content service
    pub fn new(
        users: Arc<dyn UserRepository>,
        themes: Arc<dyn ThemeRepository>,
        articles: Arc<dyn ArticleRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            users,
            themes,
            articles,
            comments,
        }
    }

    /// Build the article feed for a user's subscriptions.
    ///
    /// Articles are grouped per theme in subscription listing order, with
    /// each theme's articles in store order. An unresolvable author aborts
    /// the whole feed.
    pub async fn feed(&self, user_id: i64) -> Result<Vec<ArticleView>, ContentError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(ContentError::NotFound)?;

        let themes = self.users.subscribed_themes(user_id).await?;
        let mut feed = Vec::new();
        for theme in &themes {
            let articles = self.articles.list_by_theme(theme.id).await?;
            for article in articles {
                let author = self.resolve_author(&article).await?;
                feed.push(to_view(article, &author.username, &theme.title));
            }
        }
        Ok(feed)
    }

    /// Get a single article by ID with its comments.
    ///
    /// An article whose author or theme no longer resolves reads as absent.
    pub async fn get_article(&self, id: i64) -> Result<ArticleDetail, ContentError> {
        let article = self
            .articles
            .get_by_id(id)
            .await?
            .ok_or(ContentError::NotFound)?;

        let author = self
            .users
            .get_by_id(article.user_id)
            .await?
            .ok_or(ContentError::NotFound)?;
        let theme = self
            .themes
            .get_by_id(article.theme_id)
            .await?
            .ok_or(ContentError::NotFound)?;
        let comments = self.comments.list_by_article(article.id).await?;

        Ok(ArticleDetail {
            article: to_view(article, &author.username, &theme.title),
            comments,
        })
    }

    /// Publish a new article under a theme
    pub async fn create_article(
        &self,
        user_id: i64,
        input: NewArticle,
    ) -> Result<ArticleView, ContentError> {
        if input.title.trim().is_empty() {
            return Err(ContentError::Validation("Title cannot be empty".into()));
        }
        if input.content.trim().is_empty() {
            return Err(ContentError::Validation("Content cannot be empty".into()));
        }

        let author = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(ContentError::NotFound)?;
        let theme = self
            .themes
            .get_by_id(input.theme_id)
            .await?
            .ok_or(ContentError::NotFound)?;

        let now = Utc::now();
        let article = self
            .articles
            .create(&Article {
                id: 0,
                title: input.title,
                content: input.content,
                user_id,
                theme_id: theme.id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(article_id = article.id, user_id, theme_id = theme.id, "article published");
        Ok(to_view(article, &author.username, &theme.title))
    }

    /// Add a comment to an article.
    ///
    /// The commenter's current username is copied onto the comment row, so a
    /// later rename leaves existing comments untouched.
    pub async fn add_comment(
        &self,
        user_id: i64,
        article_id: i64,
        content: String,
    ) -> Result<Comment, ContentError> {
        if content.trim().is_empty() {
            return Err(ContentError::Validation("Content cannot be empty".into()));
        }

        let author = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(ContentError::NotFound)?;
        self.articles
            .get_by_id(article_id)
            .await?
            .ok_or(ContentError::NotFound)?;

        let comment = self
            .comments
            .create(&Comment {
                id: 0,
                content,
                user_id,
                article_id,
                author_name: author.username,
            })
            .await?;

        tracing::debug!(comment_id = comment.id, article_id, "comment added");
        Ok(comment)
    }

    /// List an article's comments in store order
    pub async fn list_comments(&self, article_id: i64) -> Result<Vec<Comment>, ContentError> {
        self.articles
            .get_by_id(article_id)
            .await?
            .ok_or(ContentError::NotFound)?;

        Ok(self.comments.list_by_article(article_id).await?)
    }

    async fn resolve_author(&self, article: &Article) -> Result<User, ContentError> {
        self.users
            .get_by_id(article.user_id)
            .await?
            .ok_or_else(|| {
                ContentError::InconsistentData(format!(
                    "article {} references missing user {}",
                    article.id, article.user_id
                ))
            })
    }
}

fn to_view(article: Article, author_name: &str, theme_title: &str) -> ArticleView {
    ArticleView {
        id: article.id,
        title: article.title,
        content: article.content,
        author_name: author_name.to_string(),
        theme_id: article.theme_id,
        theme_title: theme_title.to_string(),
        created_at: article.created_at,
        updated_at: article.updated_at,
    }
}
