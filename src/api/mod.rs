//! API layer - HTTP handlers and routing
//!
//! Registration and login are public; everything else requires a valid
//! bearer token. Theme creation additionally requires the admin role.

pub mod articles;
pub mod auth;
pub mod comments;
pub mod middleware;
pub mod profile;
pub mod themes;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes
    let admin_routes = Router::new()
        .route("/themes", post(themes::create_theme))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .route("/me", get(profile::me))
        .route("/me", put(profile::update_me))
        .route("/subscribe/{theme_id}", post(profile::subscribe))
        .route("/unsubscribe/{theme_id}", delete(profile::unsubscribe))
        .route("/themes", get(themes::list_themes))
        .route("/themes/{id}", get(themes::get_theme))
        .route("/articles", get(articles::feed))
        .route("/articles", post(articles::create_article))
        .route("/articles/{id}", get(articles::get_article))
        .route("/articles/{id}/comments", get(comments::list_comments))
        .route("/comments", post(comments::create_comment))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::db::repositories::{
        SqlxArticleRepository, SqlxCommentRepository, SqlxThemeRepository, SqlxUserRepository,
        UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::UserRole;
    use crate::services::{ContentService, ProfileService, ThemeService, TokenService};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::boxed(pool.clone());
        let themes = SqlxThemeRepository::boxed(pool.clone());
        let articles = SqlxArticleRepository::boxed(pool.clone());
        let comments = SqlxCommentRepository::boxed(pool.clone());
        let tokens = Arc::new(TokenService::new(&AuthConfig::default()));

        AppState {
            pool,
            users: users.clone(),
            profile_service: Arc::new(ProfileService::new(
                users.clone(),
                themes.clone(),
                tokens.clone(),
            )),
            content_service: Arc::new(ContentService::new(
                users.clone(),
                themes.clone(),
                articles,
                comments,
            )),
            theme_service: Arc::new(ThemeService::new(themes)),
            token_service: tokens,
        }
    }

    fn app(state: AppState) -> Router {
        build_router(state, "http://localhost:4200")
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn authed_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    }

    async fn register_and_login(router: &Router, username: &str) -> String {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "Sufficient1",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                json!({
                    "username_or_email": username,
                    "password": "Sufficient1",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"]
            .as_str()
            .expect("token missing")
            .to_string()
    }

    #[tokio::test]
    async fn test_register_login_me_flow() {
        let router = app(test_state().await);
        let token = register_and_login(&router, "alice").await;

        let response = router
            .clone()
            .oneshot(authed_request("GET", "/api/me", &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let me = body_json(response).await;
        assert_eq!(me["username"], "alice");
        assert_eq!(me["email"], "alice@example.com");
        assert!(me["subscriptions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let router = app(test_state().await);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .clone()
            .oneshot(authed_request("GET", "/api/me", "garbage", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let state = test_state().await;
        let router = app(state);
        register_and_login(&router, "alice").await;

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                json!({"username_or_email": "alice", "password": "WrongPass1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflict() {
        let router = app(test_state().await);
        register_and_login(&router, "alice").await;

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                json!({
                    "username": "alice",
                    "email": "other@example.com",
                    "password": "Sufficient1",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_subscription_feed_flow() {
        let state = test_state().await;
        let theme = state
            .theme_service
            .create("Rust".to_string(), String::new())
            .await
            .expect("Failed to create theme");
        let router = app(state);
        let token = register_and_login(&router, "alice").await;

        // Subscribe, publish, read the feed back
        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                &format!("/api/subscribe/{}", theme.id),
                &token,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let me = body_json(response).await;
        assert_eq!(me["subscriptions"][0]["title"], "Rust");

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/articles",
                &token,
                Some(json!({
                    "title": "Hello",
                    "content": "World",
                    "theme_id": theme.id,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let article = body_json(response).await;
        assert_eq!(article["author_name"], "alice");
        assert_eq!(article["theme_title"], "Rust");

        let response = router
            .clone()
            .oneshot(authed_request("GET", "/api/articles", &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let feed = body_json(response).await;
        assert_eq!(feed.as_array().unwrap().len(), 1);
        assert_eq!(feed[0]["title"], "Hello");
    }

    #[tokio::test]
    async fn test_double_subscribe_conflict() {
        let state = test_state().await;
        let theme = state
            .theme_service
            .create("Rust".to_string(), String::new())
            .await
            .expect("Failed to create theme");
        let router = app(state);
        let token = register_and_login(&router, "alice").await;

        let uri = format!("/api/subscribe/{}", theme.id);
        let response = router
            .clone()
            .oneshot(authed_request("POST", &uri, &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(authed_request("POST", &uri, &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_comment_flow() {
        let state = test_state().await;
        let theme = state
            .theme_service
            .create("Rust".to_string(), String::new())
            .await
            .expect("Failed to create theme");
        let router = app(state);
        let token = register_and_login(&router, "alice").await;

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/articles",
                &token,
                Some(json!({"title": "Post", "content": "Body", "theme_id": theme.id})),
            ))
            .await
            .unwrap();
        let article_id = body_json(response).await["id"].as_i64().unwrap();

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/comments",
                &token,
                Some(json!({"article_id": article_id, "content": "first!"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router
            .clone()
            .oneshot(authed_request(
                "GET",
                &format!("/api/articles/{}/comments", article_id),
                &token,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let comments = body_json(response).await;
        assert_eq!(comments[0]["content"], "first!");
        assert_eq!(comments[0]["author_name"], "alice");
    }

    #[tokio::test]
    async fn test_get_unknown_article_not_found() {
        let router = app(test_state().await);
        let token = register_and_login(&router, "alice").await;

        let response = router
            .clone()
            .oneshot(authed_request("GET", "/api/articles/999", &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_theme_requires_admin() {
        let state = test_state().await;
        let users = state.users.clone();
        let router = app(state);
        let token = register_and_login(&router, "alice").await;

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/themes",
                &token,
                Some(json!({"title": "Rust"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Promote and retry
        let mut user = users
            .get_by_username("alice")
            .await
            .unwrap()
            .expect("user missing");
        user.role = UserRole::Admin;
        users.update(&user).await.unwrap();

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/themes",
                &token,
                Some(json!({"title": "Rust"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_update_profile_via_api() {
        let router = app(test_state().await);
        let token = register_and_login(&router, "alice").await;

        let response = router
            .clone()
            .oneshot(authed_request(
                "PUT",
                "/api/me",
                &token,
                Some(json!({"username": "alicia", "email": "alicia@example.com"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let me = body_json(response).await;
        assert_eq!(me["username"], "alicia");
    }
}
