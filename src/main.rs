use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use calculator_backend::config::AppConfig;
use calculator_backend::router::create_router;
use calculator_backend::services::random_string::RandomOrgClient;
use calculator_backend::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,calculator_backend=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None).await?;

    if config.random_api_key.is_none() {
        tracing::warn!("RANDOM_API_KEY not set - random_string operations will fail");
    }
    let random_strings = Arc::new(RandomOrgClient::new(
        config.random_api_url.clone(),
        config.random_api_key.clone(),
    ));

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(db, config, random_strings);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
