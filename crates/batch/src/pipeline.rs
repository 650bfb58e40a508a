use adscan_core::TaskResult;
use async_trait::async_trait;

/// Runs one batch of URLs through the full extraction pipeline (the
/// equivalent of C1-C9 for however many URLs survive tracker/preflight
/// filtering) and reports back what happened to each.
///
/// The orchestrator (C10) is deliberately generic over this trait, mirroring
/// how the crawler's network drivers are abstracted behind a single async
/// trait rather than hard-wired to one transport: the orchestrator only
/// needs "run these URLs, tell me the outcomes, or tell me the whole attempt
/// failed" and should not know about tracker filtering, browser pools, or
/// sinks.
///
/// A returned `Err` means the batch itself could not be attempted at all
/// (tracker connection lost, browser pool failed to come up, preflight
/// cluster unreachable) -- a transient, batch-level failure that should
/// trigger C10's Recovering state. Per-URL failures are never surfaced this
/// way; they come back as `Ok(vec![TaskResult::Error { .. }, ..])`.
///
/// `urls.len()` may exceed `results.len()`: any URL the pipeline's own
/// bookkeeping decides to skip (already processed, out of scope) is simply
/// absent from the result vector rather than reported as an outcome.
#[async_trait]
pub trait BatchPipeline: Send + Sync {
    async fn run_batch(&self, urls: &[String], concurrency: usize) -> anyhow::Result<Vec<TaskResult>>;

    /// Re-run a subset of URLs under the relaxed settings of the retry pass
    /// (C11): lower concurrency, longer per-phase timeouts. Implementations
    /// typically delegate to the same machinery as `run_batch` with a
    /// different `PageTaskConfig`.
    async fn run_retry_batch(&self, urls: &[String]) -> anyhow::Result<Vec<TaskResult>>;
}
