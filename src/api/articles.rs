//! Article endpoints
//!
//! The article list is the caller's subscription feed, not a global listing;
//! single articles remain reachable by ID regardless of subscriptions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::NewArticle;
use crate::services::content::{ArticleDetail, ArticleView};

/// GET /api/articles
pub async fn feed(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<ArticleView>>, ApiError> {
    let articles = state.content_service.feed(user.id).await?;
    Ok(Json(articles))
}

/// GET /api/articles/{id}
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleDetail>, ApiError> {
    let article = state.content_service.get_article(id).await?;
    Ok(Json(article))
}

/// POST /api/articles
pub async fn create_article(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(payload): Json<NewArticle>,
) -> Result<(StatusCode, Json<ArticleView>), ApiError> {
    let article = state.content_service.create_article(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(article)))
}
