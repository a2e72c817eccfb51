//! Devfeed server binary: load settings, open the store, wire the services,
//! and serve the API.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use devfeed::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxArticleRepository, SqlxCommentRepository, SqlxThemeRepository, SqlxUserRepository,
            UserRepository,
        },
    },
    services::{ContentService, ProfileService, ThemeService, TokenService},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devfeed=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load_with_env(Path::new("config.yml"))?;

    let pool = db::create_pool(&config.database).await?;
    tracing::info!(driver = ?config.database.driver, "store opened");

    let migrated = db::migrations::run_migrations(&pool).await?;
    tracing::info!(migrations = migrated, "schema ready");

    let users = SqlxUserRepository::boxed(pool.clone());
    let themes = SqlxThemeRepository::boxed(pool.clone());
    let articles = SqlxArticleRepository::boxed(pool.clone());
    let comments = SqlxCommentRepository::boxed(pool.clone());

    let user_count = users.count().await?;
    tracing::info!(users = user_count, "store ready");

    let token_service = Arc::new(TokenService::new(&config.auth));
    let profile_service = Arc::new(ProfileService::new(
        users.clone(),
        themes.clone(),
        token_service.clone(),
    ));
    let content_service = Arc::new(ContentService::new(
        users.clone(),
        themes.clone(),
        articles,
        comments,
    ));
    let theme_service = Arc::new(ThemeService::new(themes));

    let state = AppState {
        pool,
        users,
        profile_service,
        content_service,
        theme_service,
        token_service,
    };

    let app = api::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
