use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "adscan", about = "Prebid.js / ad-tech extraction crawler")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a list of URLs for Prebid.js / ad-tech signals
    Scan {
        /// Local file (.txt/.csv/.json) of candidate URLs
        input_file: Option<String>,

        /// Remote URL to fetch the candidate list from (hosted-git blob URLs are rewritten to raw)
        #[arg(long = "githubRepo")]
        github_repo: Option<String>,

        /// Cap the loaded list to the first N URLs
        #[arg(long = "numUrls")]
        num_urls: Option<usize>,

        /// Reserved for parity with the source tool; this implementation has a single browser backend
        #[arg(long = "puppeteerType", default_value = "vanilla")]
        puppeteer_type: String,

        /// Browser pool worker count
        #[arg(long)]
        concurrency: Option<usize>,

        /// Run the browser headless
        #[arg(long, overrides_with = "no_headless")]
        headless: bool,
        #[arg(long = "no-headless", overrides_with = "headless")]
        no_headless: bool,

        /// Print periodic progress while scanning
        #[arg(long)]
        monitor: bool,

        /// Directory results are written to
        #[arg(long = "outputDir")]
        output_dir: Option<String>,

        /// Directory categorized error/no-data files are written to
        #[arg(long = "logDir")]
        log_dir: Option<String>,

        /// 1-based inclusive range over the loaded list, e.g. "1-50", "10-", "-20"
        #[arg(long)]
        range: Option<String>,

        /// Alias for --batchSize, kept for parity with the source tool's flag name
        #[arg(long = "chunkSize")]
        chunk_size: Option<u64>,

        /// Skip URLs the tracker already marks processed
        #[arg(long = "skipProcessed")]
        skip_processed: bool,

        /// Clear all tracker records before running
        #[arg(long = "resetTracking")]
        reset_tracking: bool,

        /// Compute skip counts against the tracker but do not filter (dry accounting)
        #[arg(long = "prefilterProcessed")]
        prefilter_processed: bool,

        /// Ignore tracker permanence and reprocess every URL in range
        #[arg(long = "forceReprocess")]
        force_reprocess: bool,

        /// Run DNS/TLS preflight before opening a browser
        #[arg(long = "preflightCheck")]
        preflight_check: bool,

        /// Treat DNS preflight failures as permanent errors, skip the browser
        #[arg(long = "skipDNSFailed")]
        skip_dns_failed: bool,

        /// Treat TLS preflight failures as permanent errors, skip the browser
        #[arg(long = "skipSSLFailed")]
        skip_ssl_failed: bool,

        /// Forward discoveryMode to the in-page payload
        #[arg(long = "discoveryMode")]
        discovery_mode: bool,

        /// Forward extractMetadata to the in-page payload
        #[arg(long = "extractMetadata")]
        extract_metadata: bool,

        /// Ad unit detail level forwarded to the in-page payload: basic|standard|full
        #[arg(long = "adUnitDetail", default_value = "basic")]
        ad_unit_detail: String,

        /// Module detail level forwarded to the in-page payload: simple|categorized
        #[arg(long = "moduleDetail", default_value = "simple")]
        module_detail: String,

        /// Run as a sequence of persisted, resumable batches (C10) instead of one pass
        #[arg(long = "batchMode")]
        batch_mode: bool,

        /// First 1-based URL position of the batch run
        #[arg(long = "startUrl")]
        start_url: Option<u64>,

        /// Number of URLs the batch run covers
        #[arg(long = "totalUrls")]
        total_urls: Option<u64>,

        /// URLs per batch
        #[arg(long = "batchSize")]
        batch_size: Option<u64>,

        /// Resume a batch run from this 1-based batch number
        #[arg(long = "resumeBatch")]
        resume_batch: Option<u64>,

        /// Run C1-C4 (load, range, tracker filter, validate) and print counts without opening a browser
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Show tracker statistics
    Status,
    /// Clear all tracker records
    Reset,
    /// Seed the tracker from existing dated result files under a store directory
    SeedTracker {
        /// Store root to scan for PageData JSON files
        #[arg(long = "storeRoot")]
        store_root: Option<String>,
    },
}
