//! agricms server

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agricms::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db,
    functions::HttpFunctions,
    storage::LocalStorage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agricms=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting agricms...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let cache = create_cache(&config.cache);
    let storage = LocalStorage::boxed(&config.storage);
    let functions = HttpFunctions::boxed(&config.functions)?;
    if config.functions.base_url.is_none() {
        tracing::warn!("Remote functions not configured; campaign sends will fail");
    }

    let state = AppState::new(pool, cache, storage, functions, &config);

    if state.auth.bootstrap_admin(&config.admin).await?.is_some() {
        tracing::info!("Bootstrap admin account created");
    }

    // Build router
    let app = api::build_router(state, &config);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
