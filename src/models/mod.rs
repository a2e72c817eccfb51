//! Data models
//!
//! Entities persisted by the repository layer.

pub mod article;
pub mod comment;
pub mod theme;
pub mod user;

pub use article::{Article, NewArticle};
pub use comment::Comment;
pub use theme::Theme;
pub use user::{User, UserRole};
