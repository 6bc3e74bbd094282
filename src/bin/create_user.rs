use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use calculator_backend::config::AppConfig;
use calculator_backend::services::users::create_user;

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

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("Usage: cargo run --bin create_user <username> <password> [balance]");
        eprintln!("Example: cargo run --bin create_user admin@example.com s3cret 10");
        std::process::exit(1);
    }

    let balance = match args.get(3) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(balance) => Some(balance),
            Err(_) => {
                eprintln!("Invalid balance. Must be a number.");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let config = AppConfig::from_env()?;
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;
    migration::Migrator::up(&db, None).await?;

    match create_user(&db, &args[1], &args[2], balance).await {
        Ok(user) => {
            println!("Created user {} (id {}) with balance {}", user.username, user.id, user.balance);
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to create user: {}", e.developer_message());
            std::process::exit(1);
        }
    }
}
