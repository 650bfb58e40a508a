use std::path::PathBuf;
use std::time::Duration;

use adscan_core::{BatchProgress, BatchStatistics, CompletedBatch, FailedBatch, TaskResult};
use adscan_tracker::Tracker;
use chrono::Utc;
use tracing::{info, warn};

use crate::error::BatchError;
use crate::pipeline::BatchPipeline;
use crate::progress;
use crate::retry::run_retry_pass;

const RECOVERY_DELAY: Duration = Duration::from_secs(10);

pub struct BatchOrchestratorConfig {
    pub batch_size: u64,
    pub inter_batch_delay: Duration,
    pub progress_dir: PathBuf,
    pub skip_verification: bool,
    pub concurrency: usize,
    /// 1-based batch number to start from, overriding whatever batch the
    /// on-disk progress would otherwise resume at (§4.10 `--resumeBatch`).
    /// Has no effect if progress already covers a later batch.
    pub resume_batch: Option<u64>,
}

pub struct BatchOrchestrator<'a, P: BatchPipeline + ?Sized> {
    pipeline: &'a P,
    tracker: &'a Tracker,
    config: BatchOrchestratorConfig,
}

impl<'a, P: BatchPipeline + ?Sized> BatchOrchestrator<'a, P> {
    pub fn new(pipeline: &'a P, tracker: &'a Tracker, config: BatchOrchestratorConfig) -> Self {
        Self { pipeline, tracker, config }
    }

    /// Runs batches covering `urls[start_url..=end_url]` (1-based, inclusive
    /// indices into `urls`), resuming from whatever `BatchProgress` is on
    /// disk for this `(start_url, end_url)` pair. See §4.10's state table:
    /// Idle -> Running -> Succeeded on a clean batch, Running -> Recovering
    /// -> Succeeded/Failed when the pipeline itself throws.
    pub async fn run(&self, urls: &[String], start_url: u64, end_url: u64) -> Result<BatchProgress, BatchError> {
        let batch_size = self.config.batch_size.max(1);
        let mut state = progress::load_or_new(&self.config.progress_dir, start_url, end_url, batch_size).await?;

        let total_urls = end_url - start_url + 1;
        let total_batches = total_urls.div_ceil(batch_size);
        let already_done = (state.completed_batches.len() + state.failed_batches.len()) as u64;
        let resume_from = already_done + 1;
        let first_batch = self.config.resume_batch.map_or(resume_from, |b| b.max(resume_from));

        for batch_number in first_batch..=total_batches {
            let batch_start = start_url + (batch_number - 1) * batch_size;
            let batch_end = (batch_start + batch_size - 1).min(end_url);
            let slice = slice_range(urls, start_url, batch_start, batch_end);

            info!(batch_number, batch_start, batch_end, "starting batch");
            let began = Utc::now();
            let t0 = std::time::Instant::now();

            let outcome = match self.run_one(&slice, self.config.concurrency).await {
                Ok(results) => Some(results),
                Err(err) => {
                    warn!(error = %err, batch_number, "batch failed, entering recovery");
                    tokio::time::sleep(RECOVERY_DELAY).await;
                    let reduced = (self.config.concurrency / 2).max(1);
                    match self.run_one(&slice, reduced).await {
                        Ok(results) => Some(results),
                        Err(retry_err) => {
                            state.failed_batches.push(FailedBatch {
                                batch_number,
                                range: (batch_start, batch_end),
                                failed_at: Utc::now(),
                                duration_ms: t0.elapsed().as_millis() as u64,
                                statistics: BatchStatistics::default(),
                                error: retry_err.to_string(),
                            });
                            None
                        }
                    }
                }
            };

            if let Some(results) = outcome {
                let statistics = self.build_statistics(&slice, &results).await;
                state.completed_batches.push(CompletedBatch {
                    batch_number,
                    range: (batch_start, batch_end),
                    completed_at: Utc::now(),
                    duration_ms: t0.elapsed().as_millis() as u64,
                    statistics,
                });
            }
            let _ = began;

            progress::persist(&self.config.progress_dir, &state).await?;

            if batch_number != total_batches {
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }
        }

        Ok(state)
    }

    async fn run_one(&self, slice: &[String], concurrency: usize) -> anyhow::Result<Vec<TaskResult>> {
        let results = self.pipeline.run_batch(slice, concurrency).await?;
        Ok(run_retry_pass(self.pipeline, results).await)
    }

    async fn build_statistics(&self, slice: &[String], results: &[TaskResult]) -> BatchStatistics {
        let successful_extractions = results.iter().filter(|r| matches!(r, TaskResult::Success { .. })).count() as u64;
        let no_ad_tech = results.iter().filter(|r| matches!(r, TaskResult::NoData { .. })).count() as u64;
        let errors = results.iter().filter(|r| matches!(r, TaskResult::Error { .. })).count() as u64;
        let urls_processed = successful_extractions + errors + no_ad_tech;
        let urls_skipped = (slice.len() as u64).saturating_sub(urls_processed);

        let skip_verification = if self.config.skip_verification {
            match self.tracker.verify_urls(slice).await {
                Ok(v) => Some(adscan_core::SkipVerification {
                    found_in_db: v.found_in_db,
                    missing_from_db: v.missing_from_db,
                    missing_urls: v.missing_urls,
                }),
                Err(err) => {
                    warn!(error = %err, "skip-verification query failed");
                    None
                }
            }
        } else {
            None
        };

        BatchStatistics {
            urls_processed,
            urls_skipped,
            successful_extractions,
            errors,
            no_ad_tech,
            skip_verification,
        }
    }
}

/// `start_url`/`batch_start`/`batch_end` are 1-based URL numbers over the
/// full ordered `urls` list; `full_start` is the 1-based number of
/// `urls[0]`.
fn slice_range(urls: &[String], full_start: u64, batch_start: u64, batch_end: u64) -> Vec<String> {
    let lo = (batch_start - full_start) as usize;
    let hi = (batch_end - full_start) as usize;
    urls.get(lo..=hi.min(urls.len().saturating_sub(1))).map(|s| s.to_vec()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[test]
    fn slice_range_picks_1_based_inclusive_window() {
        let urls: Vec<String> = (1..=10).map(|n| format!("https://{n}.example")).collect();
        let slice = slice_range(&urls, 1, 3, 5);
        assert_eq!(slice, vec!["https://3.example", "https://4.example", "https://5.example"]);
    }

    struct RecordingPipeline {
        batches_seen: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl BatchPipeline for RecordingPipeline {
        async fn run_batch(&self, urls: &[String], _concurrency: usize) -> anyhow::Result<Vec<TaskResult>> {
            self.batches_seen.lock().unwrap().push(urls.to_vec());
            Ok(urls.iter().map(|u| TaskResult::NoData { url: u.clone() }).collect())
        }

        async fn run_retry_batch(&self, urls: &[String]) -> anyhow::Result<Vec<TaskResult>> {
            Ok(urls.iter().map(|u| TaskResult::NoData { url: u.clone() }).collect())
        }
    }

    #[tokio::test]
    async fn resume_batch_skips_earlier_batches_on_a_fresh_run() {
        let urls: Vec<String> = (1..=10).map(|n| format!("https://{n}.example")).collect();
        let pipeline = RecordingPipeline { batches_seen: Mutex::new(Vec::new()) };
        let db_path = std::env::temp_dir().join(format!("adscan-orchestrator-test-{:?}.db", std::time::Instant::now()));
        let tracker = Tracker::open(db_path.to_str().unwrap()).await.unwrap();
        let dir = std::env::temp_dir().join(format!("adscan-orchestrator-test-progress-{:?}", std::time::Instant::now()));

        let config = BatchOrchestratorConfig {
            batch_size: 4,
            inter_batch_delay: Duration::from_millis(0),
            progress_dir: dir.clone(),
            skip_verification: false,
            concurrency: 4,
            resume_batch: Some(2),
        };
        let orchestrator = BatchOrchestrator::new(&pipeline, &tracker, config);
        let progress = orchestrator.run(&urls, 1, 10).await.unwrap();

        let batch_numbers: Vec<u64> = progress.completed_batches.iter().map(|b| b.batch_number).collect();
        assert_eq!(batch_numbers, vec![2, 3]);

        let seen = pipeline.batches_seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], vec!["https://5.example", "https://6.example", "https://7.example", "https://8.example"]);
        assert_eq!(seen[1], vec!["https://9.example", "https://10.example"]);

        let _ = std::fs::remove_dir_all(&dir);
        let _ = std::fs::remove_file(&db_path);
    }
}
