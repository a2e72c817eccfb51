//! Service layer
//!
//! Business logic lives here. Services depend on repository traits and are
//! shared across request handlers via `Arc`.

pub mod content;
pub mod password;
pub mod profile;
pub mod theme;
pub mod token;

pub use content::{ContentError, ContentService};
pub use profile::{ProfileError, ProfileService};
pub use theme::ThemeService;
pub use token::TokenService;
