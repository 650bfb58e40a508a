mod cli;
mod commands;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::warn;

// Use mimalloc to prevent memory bloat (glibc malloc doesn't release memory with high concurrency)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use adscan_core::AppConfig;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Custom Tokio runtime: the browser pool and preflight checker both hold
    // many concurrent I/O-bound tasks per worker, so size the pool above the
    // default CPU-count heuristic.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(32)
        .thread_stack_size(8 * 1024 * 1024)
        .max_blocking_threads(512)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config).unwrap_or_else(|_| {
        warn!(path = %cli.config, "config file not found, using bundled defaults");
        include_str!("../config/default.toml").to_string()
    });
    let mut config: AppConfig = toml::from_str(&config_str)?;

    apply_env_overrides(&mut config);

    tokio::select! {
        result = dispatch(config, cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received, shutting down (in-flight batch progress is already persisted)");
            Ok(())
        }
    }
}

/// Environment overrides for the knobs operators tune most often without
/// editing the config file, e.g. from a container entrypoint.
fn apply_env_overrides(config: &mut AppConfig) {
    let parse_bounded = |v: &str, max: usize| -> Option<usize> { v.parse::<usize>().ok().filter(|&n| n > 0 && n <= max) };

    if let Ok(v) = std::env::var("SCAN_CONCURRENCY") {
        if let Some(n) = parse_bounded(&v, 128) {
            config.general.concurrency = n;
            config.browser.concurrency = n;
        } else {
            warn!(value = %v, "ignoring out-of-range SCAN_CONCURRENCY");
        }
    }
    if let Ok(v) = std::env::var("SCAN_HEADLESS") {
        config.general.headless = v != "0" && v.to_lowercase() != "false";
    }
    if let Ok(v) = std::env::var("SCAN_BATCH_SIZE") {
        if let Ok(n) = v.parse::<u64>() {
            if n > 0 {
                config.batch.batch_size = n;
            }
        }
    }
}

async fn dispatch(config: AppConfig, command: Commands) -> Result<()> {
    match &command {
        Commands::Scan { .. } => commands::scan::run(config, command).await,
        Commands::Status => commands::status::run(&config).await,
        Commands::Reset => commands::reset::run(&config).await,
        Commands::SeedTracker { store_root } => {
            commands::seed_tracker::run(&config, store_root.clone()).await
        }
    }
}
