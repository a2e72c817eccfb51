//! Shared HTTP plumbing
//!
//! Application state, the bearer-token and admin guards, and the JSON error
//! envelope `{"error": {"code", "message"}}` that every endpoint returns on
//! failure.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repositories::UserRepository;
use crate::models::User;
use crate::services::{
    ContentError, ContentService, ProfileError, ProfileService, ThemeService, TokenService,
};

/// Everything handlers need, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub users: Arc<dyn UserRepository>,
    pub profile_service: Arc<ProfileService>,
    pub content_service: Arc<ContentService>,
    pub theme_service: Arc<ThemeService>,
    pub token_service: Arc<TokenService>,
}

/// The caller's account, placed in request extensions by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Wire shape of an error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// An HTTP error carrying its status and the JSON body to render
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn build(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: ErrorDetail {
                    code: code.to_string(),
                    message: message.into(),
                },
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::build(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::build(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::build(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::build(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::build(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::build(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.body.error.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ProfileError> for ApiError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::Validation(msg) => ApiError::validation(msg),
            ProfileError::DuplicateUsername => ApiError::conflict("Username already taken"),
            ProfileError::DuplicateEmail => ApiError::conflict("Email already registered"),
            ProfileError::NotFound => ApiError::not_found("Not found"),
            ProfileError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            ProfileError::AlreadySubscribed => ApiError::conflict("Already subscribed"),
            ProfileError::NotSubscribed => ApiError::conflict("Not subscribed"),
            ProfileError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::Validation(msg) => ApiError::validation(msg),
            ContentError::NotFound => ApiError::not_found("Not found"),
            // Broken references are surfaced, not papered over
            ContentError::InconsistentData(msg) => {
                tracing::error!(%msg, "inconsistent data");
                ApiError::internal("Internal server error")
            }
            ContentError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                ApiError::internal("Internal server error")
            }
        }
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the bearer token to an account and stash it in the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?
        .to_string();

    let user_id = state
        .token_service
        .verify(&token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    let user = state
        .users
        .get_by_id(user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "user lookup failed");
            ApiError::internal("Internal server error")
        })?
        .ok_or_else(|| ApiError::unauthorized("Unknown user"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Reject non-admin callers. Must run after [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let caller = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if caller.0.is_admin() {
        Ok(next.run(request).await)
    } else {
        Err(ApiError::forbidden("Admin privileges required"))
    }
}
