use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use adscan_batch::{retry::run_retry_pass, BatchOrchestrator, BatchOrchestratorConfig, BatchPipeline};
use adscan_core::{AppConfig, AdUnitDetail, ModuleDetail, PayloadOptions, TaskResult};
use adscan_loader::{LoadOptions, LoadSource, UrlLoader};
use adscan_preflight::{CheckerConfig, ValidatorConfig};
use adscan_sink::ResultsSink;
use adscan_tracker::Tracker;
use anyhow::{bail, Result};
use tracing::info;

use crate::cli::Commands;
use crate::pipeline::{ScanPipeline, ScanPipelineConfig};

pub async fn run(config: AppConfig, command: Commands) -> Result<()> {
    let Commands::Scan {
        input_file,
        github_repo,
        num_urls,
        puppeteer_type: _,
        concurrency,
        headless,
        no_headless,
        monitor: _,
        output_dir,
        log_dir,
        range,
        chunk_size,
        skip_processed,
        reset_tracking,
        prefilter_processed,
        force_reprocess,
        preflight_check,
        skip_dns_failed,
        skip_ssl_failed,
        discovery_mode,
        extract_metadata,
        ad_unit_detail,
        module_detail,
        batch_mode,
        start_url,
        total_urls,
        batch_size,
        resume_batch,
        dry_run,
    } = command
    else {
        unreachable!("commands::scan::run called with a non-Scan command")
    };

    let loader = UrlLoader::new();
    let source_path;
    let source = match (&github_repo, &input_file) {
        (Some(remote), _) => LoadSource::Remote(remote),
        (None, Some(path)) => {
            source_path = path.clone();
            LoadSource::LocalFile(Path::new(&source_path))
        }
        (None, None) => bail!("scan requires either a positional inputFile or --githubRepo"),
    };
    let load_options = LoadOptions { num_urls, start_range: None, end_range: None };
    let full_list = loader.load(source, &load_options).await?;
    info!(total = full_list.len(), "loaded candidate URLs");

    let ranged = adscan_loader::apply_range(&full_list, range.as_deref());
    for warning in &ranged.warnings {
        tracing::warn!("{warning}");
    }
    let selected = ranged.selected;

    let tracker = Arc::new(Tracker::open(&config.tracker.db_path).await?);
    if reset_tracking {
        tracker.reset().await?;
    }

    let output_dir = output_dir.unwrap_or_else(|| config.sink.output_dir.clone());
    let log_dir = log_dir.unwrap_or_else(|| config.sink.error_dir.clone());
    let sink = Arc::new(ResultsSink::new(output_dir.clone(), log_dir));

    if prefilter_processed {
        let unprocessed = tracker.filter_unprocessed(&selected).await?;
        println!(
            "Prefilter: {} in range, {} already processed, {} would be scanned.",
            selected.len(),
            selected.len() - unprocessed.len(),
            unprocessed.len()
        );
        if dry_run {
            return Ok(());
        }
    }

    if dry_run {
        let unprocessed = if skip_processed && !force_reprocess {
            tracker.filter_unprocessed(&selected).await?
        } else {
            selected.clone()
        };
        println!(
            "Dry run: {} in range, {} would be scanned, {} would be skipped.",
            selected.len(),
            unprocessed.len(),
            selected.len() - unprocessed.len()
        );
        return Ok(());
    }

    let ad_unit_detail = parse_ad_unit_detail(&ad_unit_detail)?;
    let module_detail = parse_module_detail(&module_detail)?;
    let payload_options = PayloadOptions {
        discovery_mode,
        extract_metadata,
        ad_unit_detail,
        module_detail,
        ..PayloadOptions::default()
    };

    let concurrency = concurrency.unwrap_or(config.general.concurrency);
    let mut browser_config = config.browser.clone();
    browser_config.concurrency = concurrency;

    let checker = CheckerConfig {
        check_dns: config.preflight.check_dns,
        check_ssl: config.preflight.check_ssl,
        dns_concurrency: config.preflight.dns_concurrency,
        ssl_concurrency: config.preflight.ssl_concurrency,
        dns_timeout: Duration::from_secs(config.preflight.dns_timeout_seconds),
        ssl_timeout: Duration::from_secs(config.preflight.ssl_timeout_seconds),
    };

    let pipeline = ScanPipeline {
        tracker: tracker.clone(),
        sink,
        config: ScanPipelineConfig {
            skip_processed,
            force_reprocess,
            preflight_check: preflight_check || config.preflight.enabled,
            skip_dns_failed: skip_dns_failed || config.preflight.skip_dns_failed,
            skip_ssl_failed: skip_ssl_failed || config.preflight.skip_ssl_failed,
            max_retries: config.tracker.max_retries,
            headless: resolve_headless(headless, no_headless, config.general.headless),
            browser: browser_config,
            checker,
            validator: ValidatorConfig::default(),
        },
        payload_options,
    };

    let results = if batch_mode {
        let start = start_url.unwrap_or(1);
        let total = total_urls.unwrap_or(selected.len() as u64);
        let end = start + total - 1;
        let orchestrator_config = BatchOrchestratorConfig {
            batch_size: batch_size.or(chunk_size).unwrap_or(config.batch.batch_size),
            inter_batch_delay: Duration::from_secs(config.batch.inter_batch_delay_seconds),
            progress_dir: config.batch.progress_dir.clone().into(),
            skip_verification: config.batch.skip_verification,
            concurrency,
            resume_batch,
        };
        let orchestrator = BatchOrchestrator::new(&pipeline, &tracker, orchestrator_config);
        let progress = orchestrator.run(&selected, start, end).await?;

        print_batch_summary(&progress);
        Vec::new()
    } else {
        let raw = pipeline.run_batch(&selected, concurrency).await?;
        run_retry_pass(&pipeline, raw).await
    };

    if !results.is_empty() {
        print_summary(&selected, &results);
    }

    if let Some(path) = input_file.filter(|p| p.ends_with(".txt")) {
        rewrite_txt_source(&path, &selected, &results).await;
    }

    let suggestions = tracker.suggest_next_ranges(&full_list, selected.len().max(1), 3).await?;
    if !suggestions.is_empty() {
        println!("\nSuggested next ranges (least processed first):");
        for s in suggestions {
            println!("  {}-{} ({:.0}% unprocessed)", s.start, s.end, s.unprocessed_fraction * 100.0);
        }
    }

    let _ = prefilter_processed;
    Ok(())
}

fn resolve_headless(headless: bool, no_headless: bool, config_default: bool) -> bool {
    if no_headless {
        false
    } else if headless {
        true
    } else {
        config_default
    }
}

fn parse_ad_unit_detail(s: &str) -> Result<AdUnitDetail> {
    Ok(match s {
        "basic" => AdUnitDetail::Basic,
        "standard" => AdUnitDetail::Standard,
        "full" => AdUnitDetail::Full,
        other => bail!("invalid --adUnitDetail '{other}' (expected basic|standard|full)"),
    })
}

fn parse_module_detail(s: &str) -> Result<ModuleDetail> {
    Ok(match s {
        "simple" => ModuleDetail::Simple,
        "categorized" => ModuleDetail::Categorized,
        other => bail!("invalid --moduleDetail '{other}' (expected simple|categorized)"),
    })
}

fn print_summary(selected: &[String], results: &[TaskResult]) {
    let successes = results.iter().filter(|r| matches!(r, TaskResult::Success { .. })).count();
    let no_data = results.iter().filter(|r| matches!(r, TaskResult::NoData { .. })).count();
    let errors = results.iter().filter(|r| matches!(r, TaskResult::Error { .. })).count();
    let skipped = selected.len().saturating_sub(results.len());

    println!("\nScan summary:");
    println!("  In range:               {}", selected.len());
    println!("  Skipped (processed):    {skipped}");
    println!("  Successful extractions: {successes}");
    println!("  No ad tech found:       {no_data}");
    println!("  Errors:                 {errors}");
}

fn print_batch_summary(progress: &adscan_core::BatchProgress) {
    println!("\nBatch run summary ({}..{}):", progress.start_url, progress.end_url);
    println!("  Completed batches: {}", progress.completed_batches.len());
    println!("  Failed batches:    {}", progress.failed_batches.len());
    for failed in &progress.failed_batches {
        println!(
            "    batch {} (range {}-{}): {} -- retry with --batchMode --startUrl={} --totalUrls={} --resumeBatch={}",
            failed.batch_number,
            failed.range.0,
            failed.range.1,
            failed.error,
            progress.start_url,
            progress.end_url - progress.start_url + 1,
            failed.batch_number,
        );
    }
}

async fn rewrite_txt_source(path: &str, selected: &[String], results: &[TaskResult]) {
    use std::collections::HashSet;

    let in_scope: HashSet<String> = selected.iter().cloned().collect();
    let successfully_processed: HashSet<String> = results
        .iter()
        .filter(|r| !matches!(r, TaskResult::Error { .. }))
        .map(|r| r.url().to_string())
        .collect();

    if let Err(e) =
        adscan_sink::rewrite::rewrite_txt_source(Path::new(path), &in_scope, &successfully_processed, |s| s.to_string())
            .await
    {
        tracing::warn!(path, error = %e, "failed to rewrite input .txt source");
    }
}
