//! Profile endpoints
//!
//! The authenticated user's own profile and theme subscriptions. All routes
//! here sit behind the auth middleware.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::Theme;
use crate::services::profile::{Profile, UpdateProfileInput};

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub subscriptions: Vec<Theme>,
}

impl From<Profile> for MeResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.user.id,
            username: profile.user.username,
            email: profile.user.email,
            subscriptions: profile.subscriptions,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub username: String,
    pub email: String,
}

/// GET /api/me
pub async fn me(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Result<Json<MeResponse>, ApiError> {
    let profile = state.profile_service.get_profile(user.id).await?;
    Ok(Json(profile.into()))
}

/// PUT /api/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<MeResponse>, ApiError> {
    state
        .profile_service
        .update_profile(
            user.id,
            UpdateProfileInput {
                username: payload.username,
                email: payload.email,
            },
        )
        .await?;

    let profile = state.profile_service.get_profile(user.id).await?;
    Ok(Json(profile.into()))
}

/// POST /api/subscribe/{theme_id}
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(theme_id): Path<i64>,
) -> Result<Json<MeResponse>, ApiError> {
    state.profile_service.subscribe(user.id, theme_id).await?;
    let profile = state.profile_service.get_profile(user.id).await?;
    Ok(Json(profile.into()))
}

/// DELETE /api/unsubscribe/{theme_id}
pub async fn unsubscribe(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(theme_id): Path<i64>,
) -> Result<Json<MeResponse>, ApiError> {
    state.profile_service.unsubscribe(user.id, theme_id).await?;
    let profile = state.profile_service.get_profile(user.id).await?;
    Ok(Json(profile.into()))
}
