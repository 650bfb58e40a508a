use adscan_core::AppConfig;
use adscan_tracker::Tracker;
use anyhow::Result;

pub async fn run(config: &AppConfig) -> Result<()> {
    let tracker = Tracker::open(&config.tracker.db_path).await?;
    tracker.reset().await?;
    println!("Tracker reset: all records cleared.");
    Ok(())
}
