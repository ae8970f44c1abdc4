//! PostgreSQL setup utility.
//!
//! Creates the schema if needed and seeds the configured banks, so the
//! persistence stage never runs against an empty banks table.

use anyhow::Result;
use tracing::info;

use bank_review_analytics::config::AppConfig;
use bank_review_analytics::db::Database;
use bank_review_analytics::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    let _log_guard = init_logging(&config.logging)?;

    info!(
        host = %config.database.host,
        database = %config.database.database,
        "Setting up PostgreSQL schema"
    );

    let db = Database::connect(&config.database).await?;
    db.init_schema().await?;

    for app in &config.scraper.apps {
        let bank = db.upsert_bank(&app.bank_name, &app.app_name).await?;
        info!(bank = %bank.bank_name, bank_id = bank.bank_id, "Seeded bank");
    }

    let total = db.count_reviews().await?;
    info!(reviews = total, "Reviews currently in store");
    for (bank, count) in db.reviews_per_bank().await? {
        info!(bank = %bank, reviews = count, "Rows by bank");
    }

    info!("Database setup complete");
    Ok(())
}
