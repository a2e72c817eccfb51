//! Theme endpoints
//!
//! Theme catalog reads are available to any authenticated user; creating a
//! theme requires the admin role.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::Theme;

#[derive(Debug, Deserialize)]
pub struct CreateThemeRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// GET /api/themes
pub async fn list_themes(State(state): State<AppState>) -> Result<Json<Vec<Theme>>, ApiError> {
    let themes = state.theme_service.list().await?;
    Ok(Json(themes))
}

/// GET /api/themes/{id}
pub async fn get_theme(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Theme>, ApiError> {
    let theme = state.theme_service.get(id).await?;
    Ok(Json(theme))
}

/// POST /api/themes
pub async fn create_theme(
    State(state): State<AppState>,
    Json(payload): Json<CreateThemeRequest>,
) -> Result<(StatusCode, Json<Theme>), ApiError> {
    let theme = state
        .theme_service
        .create(payload.title, payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(theme)))
}
