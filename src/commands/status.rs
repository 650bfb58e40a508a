use adscan_core::AppConfig;
use adscan_tracker::Tracker;
use anyhow::Result;

pub async fn run(config: &AppConfig) -> Result<()> {
    let tracker = Tracker::open(&config.tracker.db_path).await?;
    let stats = tracker.get_stats().await?;

    println!("Tracker stats ({}):", config.tracker.db_path);
    if stats.is_empty() {
        println!("  (no records)");
        return Ok(());
    }
    for (status, count) in stats {
        println!("  {status:<16} {count}");
    }
    Ok(())
}
