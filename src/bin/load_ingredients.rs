//! Loads the ingredient catalog from a JSON file of
//! `{"name": ..., "measurement_unit": ...}` records. Re-running with the same
//! file adds nothing.

use anyhow::Context;
use recipe_share_service::config::Config;
use recipe_share_service::db::create_pool;
use recipe_share_service::models::IngredientRecord;
use recipe_share_service::services::ingredients::import_ingredients;
use std::fs;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let path = std::env::args()
        .nth(1)
        .context("Usage: load_ingredients <path/to/ingredients.json>")?;

    let raw = fs::read_to_string(&path).with_context(|| format!("Can't read {}", path))?;
    let records: Vec<IngredientRecord> =
        serde_json::from_str(&raw).with_context(|| format!("Can't parse {}", path))?;
    log::info!("Read {} ingredient records from {}", records.len(), path);

    let config = Config::from_env()?;
    let pool = create_pool(&config).await?;

    let summary = import_ingredients(&pool, &records)
        .await
        .map_err(|e| anyhow::anyhow!("Import failed: {}", e))?;

    println!(
        "Done. Created: {}, skipped (already present): {}.",
        summary.created, summary.skipped
    );
    Ok(())
}
