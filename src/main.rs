use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use social_api::{
    auth::{PgUserStore, TokenService},
    config::AppConfig,
    create_router, db,
    posts::PgPostStore,
    uploads::UploadConfig,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "social_api=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    tracing::info!("Social API - Starting...");

    let config = AppConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Migrations completed successfully");

    tokio::fs::create_dir_all(&config.assets_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.assets_dir.display()))?;

    let state = AppState::new(
        Arc::new(PgUserStore::new(db_pool.clone())),
        Arc::new(PgPostStore::new(db_pool)),
        TokenService::new(config.jwt_secret.clone(), config.token_ttl_secs),
        UploadConfig::new(&config.assets_dir, config.max_body_bytes),
    );
    let app = create_router(state, config.max_body_bytes);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Social API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
