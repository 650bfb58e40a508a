use std::path::Path;

use adscan_core::AppConfig;
use adscan_tracker::{import_existing_results, Tracker};
use anyhow::Result;

pub async fn run(config: &AppConfig, store_root: Option<String>) -> Result<()> {
    let tracker = Tracker::open(&config.tracker.db_path).await?;
    let root = store_root.unwrap_or_else(|| config.sink.output_dir.clone());
    let seeded = import_existing_results(&tracker, Path::new(&root)).await?;
    println!("Seeded tracker from {root}: {seeded} URLs marked success.");
    Ok(())
}
