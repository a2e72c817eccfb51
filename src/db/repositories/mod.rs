//! Repository layer
//!
//! One repository per aggregate, each defined as an async trait with a
//! SQLx-backed implementation supporting SQLite and MySQL. Services depend on
//! the traits only.

pub mod article;
pub mod comment;
pub mod theme;
pub mod user;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use theme::{SqlxThemeRepository, ThemeRepository};
pub use user::{SqlxUserRepository, UserRepository};
