#![allow(clippy::result_large_err)]

use chrono::Utc;
use dotenvy::dotenv;
use maintenance_buddy::{config, errors::Result, notify::gateway::TelegramGateway, ops};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the flat roster from config.toml
    let roster = config::flats::load_default_config()
        .inspect_err(|e| error!("Failed to load config.toml: {}", e))?;
    info!(flats = roster.flats.len(), "Loaded flat roster.");

    // 4. Initialize database
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Database connected successfully."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed missing flats, default credentials, and the current month
    config::flats::seed_database(&db, &roster)
        .await
        .inspect(|_| info!("Database seeded successfully."))
        .inspect_err(|e| error!("Failed to seed database: {}", e))?;

    // 6. Run the hourly notification scheduler; the daily marker inside the
    // tick keeps actual sends to once per day
    let gateway = TelegramGateway::new(db.clone());
    info!("Starting hourly notification scheduler.");

    let mut interval = tokio::time::interval(Duration::from_secs(60 * 60));
    loop {
        interval.tick().await;
        let today = Utc::now().date_naive();
        match ops::daily::run_daily_tick(&db, &gateway, today).await {
            Ok(outcome) => info!(?outcome, "Daily tick finished."),
            Err(e) => error!("Daily tick failed: {}", e),
        }
    }
}
