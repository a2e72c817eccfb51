//! Profile service
//!
//! Registration, login, profile reads and updates, and theme subscription
//! membership. Login accepts either an email address or a username; the
//! email lookup runs first and the username lookup only on a miss.

use crate::db::repositories::{ThemeRepository, UserRepository};
use crate::models::{Theme, User, UserRole};
use crate::services::password::{hash_password, verify_password};
use crate::services::token::TokenService;
use anyhow::Result;
use std::sync::Arc;

/// Error types for profile operations
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Username already taken
    #[error("Username already taken")]
    DuplicateUsername,

    /// Email already registered
    #[error("Email already registered")]
    DuplicateEmail,

    /// User or theme not found
    #[error("Not found")]
    NotFound,

    /// Credentials did not match
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Subscription already exists
    #[error("Already subscribed")]
    AlreadySubscribed,

    /// Subscription does not exist
    #[error("Not subscribed")]
    NotSubscribed,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Registration input
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Profile update input
#[derive(Debug, Clone)]
pub struct UpdateProfileInput {
    pub username: String,
    pub email: String,
}

/// A user together with the themes they follow
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub subscriptions: Vec<Theme>,
}

/// Profile service for account and subscription management
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    themes: Arc<dyn ThemeRepository>,
    tokens: Arc<TokenService>,
}

impl ProfileService {
    /// Create a new profile service
    pub fn new(
        users: Arc<dyn UserRepository>,
        themes: Arc<dyn ThemeRepository>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            themes,
            tokens,
        }
    }

    /// Register a new account.
    ///
    /// Usernames and emails are unique across the system. The password must
    /// be at least 8 characters and contain a digit, a lowercase letter, and
    /// an uppercase letter. New accounts always get the regular user role.
    pub async fn register(&self, input: RegisterInput) -> Result<User, ProfileError> {
        if input.username.trim().is_empty() {
            return Err(ProfileError::Validation("Username cannot be empty".into()));
        }
        if input.email.trim().is_empty() {
            return Err(ProfileError::Validation("Email cannot be empty".into()));
        }
        validate_password_strength(&input.password)?;

        if self.users.get_by_username(&input.username).await?.is_some() {
            return Err(ProfileError::DuplicateUsername);
        }
        if self.users.get_by_email(&input.email).await?.is_some() {
            return Err(ProfileError::DuplicateEmail);
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(input.username, input.email, password_hash, UserRole::User);

        match self.users.create(&user).await {
            Ok(created) => {
                tracing::info!(user_id = created.id, username = %created.username, "user registered");
                Ok(created)
            }
            // The existence checks above race with concurrent registrations;
            // the unique indexes are the source of truth.
            Err(e) => Err(map_unique_violation(e)),
        }
    }

    /// Authenticate with an email address or username plus password.
    ///
    /// Returns the user and a freshly issued bearer token.
    pub async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(User, String), ProfileError> {
        let user = match self.users.get_by_email(identifier).await? {
            Some(user) => user,
            None => self
                .users
                .get_by_username(identifier)
                .await?
                .ok_or(ProfileError::NotFound)?,
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(ProfileError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = user.id, "user authenticated");
        Ok((user, token))
    }

    /// Get a user's profile with their subscribed themes
    pub async fn get_profile(&self, user_id: i64) -> Result<Profile, ProfileError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(ProfileError::NotFound)?;
        let subscriptions = self.users.subscribed_themes(user_id).await?;

        Ok(Profile {
            user,
            subscriptions,
        })
    }

    /// Update a user's username and email.
    ///
    /// Writes only the fields that actually changed; submitting the current
    /// values is a no-op and succeeds without touching the store.
    pub async fn update_profile(
        &self,
        user_id: i64,
        input: UpdateProfileInput,
    ) -> Result<User, ProfileError> {
        if input.username.trim().is_empty() {
            return Err(ProfileError::Validation("Username cannot be empty".into()));
        }
        if input.email.trim().is_empty() {
            return Err(ProfileError::Validation("Email cannot be empty".into()));
        }

        let mut user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(ProfileError::NotFound)?;

        let mut changed = false;
        if input.username != user.username {
            if self.users.get_by_username(&input.username).await?.is_some() {
                return Err(ProfileError::DuplicateUsername);
            }
            user.username = input.username;
            changed = true;
        }
        if input.email != user.email {
            if self.users.get_by_email(&input.email).await?.is_some() {
                return Err(ProfileError::DuplicateEmail);
            }
            user.email = input.email;
            changed = true;
        }

        if !changed {
            return Ok(user);
        }

        let updated = match self.users.update(&user).await {
            Ok(updated) => updated,
            Err(e) => return Err(map_unique_violation(e)),
        };
        tracing::info!(user_id, "profile updated");
        Ok(updated)
    }

    /// Subscribe a user to a theme
    pub async fn subscribe(&self, user_id: i64, theme_id: i64) -> Result<(), ProfileError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(ProfileError::NotFound)?;
        self.themes
            .get_by_id(theme_id)
            .await?
            .ok_or(ProfileError::NotFound)?;

        if self.users.is_subscribed(user_id, theme_id).await? {
            return Err(ProfileError::AlreadySubscribed);
        }

        self.users.add_subscription(user_id, theme_id).await?;
        tracing::debug!(user_id, theme_id, "subscription added");
        Ok(())
    }

    /// Remove a user's subscription to a theme
    pub async fn unsubscribe(&self, user_id: i64, theme_id: i64) -> Result<(), ProfileError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(ProfileError::NotFound)?;
        self.themes
            .get_by_id(theme_id)
            .await?
            .ok_or(ProfileError::NotFound)?;

        if !self.users.is_subscribed(user_id, theme_id).await? {
            return Err(ProfileError::NotSubscribed);
        }

        self.users.remove_subscription(user_id, theme_id).await?;
        tracing::debug!(user_id, theme_id, "subscription removed");
        Ok(())
    }
}

/// Require at least 8 characters with a digit, a lowercase letter, and an
/// uppercase letter.
fn validate_password_strength(password: &str) -> Result<(), ProfileError> {
    if password.chars().count() < 8
        || !password.chars().any(|c| c.is_ascii_digit())
        || !password.chars().any(|c| c.is_ascii_lowercase())
        || !password.chars().any(|c| c.is_ascii_uppercase())
    {
        return Err(ProfileError::Validation(
            "Password must be at least 8 characters and contain a digit, a lowercase letter, and an uppercase letter".into(),
        ));
    }
    Ok(())
}

/// Translate a unique index violation into the matching duplicate error
fn map_unique_violation(e: anyhow::Error) -> ProfileError {
    if let Some(sqlx::Error::Database(db)) = e.downcast_ref::<sqlx::Error>() {
        if db.is_unique_violation() {
            if db.message().contains("username") {
                return ProfileError::DuplicateUsername;
            }
            return ProfileError::DuplicateEmail;
        }
    }
    ProfileError::Internal(e)
}
