use adscan_core::TaskResult;
use tracing::warn;

use crate::pipeline::BatchPipeline;

/// C11 Retry Pass: partitions a batch's results into the timeout-category
/// failures and everything else, reruns only the former under relaxed
/// settings, and replaces the originals with whatever the retry produced.
///
/// If the retry attempt itself fails outright (the pipeline-level `Err`
/// case), the original timeout results are kept as-is -- a failed retry
/// pass must never make a batch's statistics disappear.
pub async fn run_retry_pass<P: BatchPipeline + ?Sized>(pipeline: &P, results: Vec<TaskResult>) -> Vec<TaskResult> {
    let (timed_out, settled): (Vec<TaskResult>, Vec<TaskResult>) =
        results.into_iter().partition(|r| r.is_timeout_category());

    if timed_out.is_empty() {
        return settled;
    }

    let urls: Vec<String> = timed_out.iter().map(|r| r.url().to_string()).collect();

    match pipeline.run_retry_batch(&urls).await {
        Ok(retried) => settled.into_iter().chain(retried).collect(),
        Err(err) => {
            warn!(error = %err, count = timed_out.len(), "retry pass failed, keeping original timeout results");
            settled.into_iter().chain(timed_out).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adscan_core::{DetailedError, ErrorCategory, ErrorPhase};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn timeout_result(url: &str) -> TaskResult {
        TaskResult::Error {
            url: url.to_string(),
            code: "NAVIGATION_TIMEOUT".to_string(),
            message: "timed out".to_string(),
            stack: None,
            detailed: Some(DetailedError {
                category: ErrorCategory::Timeout,
                sub_category: "navigation".to_string(),
                phase: ErrorPhase::Navigation,
                code: "NAVIGATION_TIMEOUT".to_string(),
                url: url.to_string(),
                timestamp: Utc::now(),
                message: "timed out".to_string(),
            }),
        }
    }

    fn no_data_result(url: &str) -> TaskResult {
        TaskResult::NoData { url: url.to_string() }
    }

    struct FakePipeline {
        retry_calls: AtomicUsize,
        succeed: bool,
    }

    #[async_trait]
    impl BatchPipeline for FakePipeline {
        async fn run_batch(&self, _urls: &[String], _concurrency: usize) -> anyhow::Result<Vec<TaskResult>> {
            unreachable!("retry pass never calls run_batch")
        }

        async fn run_retry_batch(&self, urls: &[String]) -> anyhow::Result<Vec<TaskResult>> {
            self.retry_calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(urls.iter().map(|u| no_data_result(u)).collect())
            } else {
                Err(anyhow::anyhow!("retry pool unavailable"))
            }
        }
    }

    #[tokio::test]
    async fn leaves_non_timeout_results_untouched_and_skips_retry() {
        let pipeline = FakePipeline { retry_calls: AtomicUsize::new(0), succeed: true };
        let results = vec![no_data_result("https://a.example")];
        let out = run_retry_pass(&pipeline, results).await;
        assert_eq!(out.len(), 1);
        assert_eq!(pipeline.retry_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retries_timeout_results_and_replaces_them() {
        let pipeline = FakePipeline { retry_calls: AtomicUsize::new(0), succeed: true };
        let results = vec![timeout_result("https://a.example"), no_data_result("https://b.example")];
        let out = run_retry_pass(&pipeline, results).await;
        assert_eq!(pipeline.retry_calls.load(Ordering::SeqCst), 1);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| !r.is_timeout_category()));
    }

    #[tokio::test]
    async fn keeps_original_timeouts_when_retry_pass_fails() {
        let pipeline = FakePipeline { retry_calls: AtomicUsize::new(0), succeed: false };
        let results = vec![timeout_result("https://a.example")];
        let out = run_retry_pass(&pipeline, results).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].is_timeout_category());
    }
}
