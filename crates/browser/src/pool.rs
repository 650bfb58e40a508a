use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use adscan_core::{BrowserConfig, DetailedError, ErrorCategory, ErrorPhase, PayloadOptions, TaskResult};
use chromiumoxide::browser::Browser;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::warn;

use crate::launch;
use crate::page_task::{self, PageTaskConfig};

/// Supervised pool of up to `concurrency` workers, each owning one browser
/// context for its whole lifetime and pulling from a shared FIFO queue
/// (§4.6). Pages never outlive a single task.
pub struct BrowserPool {
    headless: bool,
    config: BrowserConfig,
}

impl BrowserPool {
    pub fn new(headless: bool, config: BrowserConfig) -> Self {
        Self { headless, config }
    }

    pub async fn run(&self, urls: Vec<String>, options: PayloadOptions) -> Vec<TaskResult> {
        if urls.is_empty() {
            return Vec::new();
        }
        let concurrency = self.config.concurrency.max(1).min(urls.len());
        let queue = Arc::new(Mutex::new(VecDeque::from(urls)));
        let results = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::with_capacity(concurrency);
        for worker_id in 0..concurrency {
            let queue = queue.clone();
            let results = results.clone();
            let headless = self.headless;
            let config = self.config.clone();
            let options = options.clone();
            handles.push(tokio::spawn(async move {
                worker_loop(worker_id, queue, results, headless, config, options).await;
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("browser pool worker panicked: {e}");
            }
        }

        Arc::try_unwrap(results)
            .map(|m| m.into_inner())
            .unwrap_or_default()
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<String>>>,
    results: Arc<Mutex<Vec<TaskResult>>>,
    headless: bool,
    config: BrowserConfig,
    options: PayloadOptions,
) {
    match launch::launch(headless, &config.user_agent).await {
        Ok(browser) => drain_queue(worker_id, &browser, &queue, &results, &config, &options).await,
        Err(e) => {
            warn!(worker_id, "failed to launch pooled browser context, falling back to browser-per-task: {e}");
            drain_queue_fallback(worker_id, &queue, &results, headless, &config, &options).await;
        }
    }
}

async fn drain_queue(
    worker_id: usize,
    browser: &Browser,
    queue: &Arc<Mutex<VecDeque<String>>>,
    results: &Arc<Mutex<Vec<TaskResult>>>,
    config: &BrowserConfig,
    options: &PayloadOptions,
) {
    let page_config = page_task_config(config);
    let hard_timeout = Duration::from_secs(config.hard_timeout_seconds);

    loop {
        let url = { queue.lock().await.pop_front() };
        let Some(url) = url else { break };

        let result = run_with_hard_timeout(browser, &url, options, &page_config, hard_timeout).await;
        results.lock().await.push(result);
    }
    let _ = worker_id;
}

/// Fallback per §4.6: if the pool's own browser context fails to launch,
/// process the rest of the queue with a fresh browser per task instead of
/// losing the worker entirely.
async fn drain_queue_fallback(
    worker_id: usize,
    queue: &Arc<Mutex<VecDeque<String>>>,
    results: &Arc<Mutex<Vec<TaskResult>>>,
    headless: bool,
    config: &BrowserConfig,
    options: &PayloadOptions,
) {
    let page_config = page_task_config(config);
    let hard_timeout = Duration::from_secs(config.hard_timeout_seconds);

    loop {
        let url = { queue.lock().await.pop_front() };
        let Some(url) = url else { break };

        let result = match launch::launch(headless, &config.user_agent).await {
            Ok(browser) => run_with_hard_timeout(&browser, &url, options, &page_config, hard_timeout).await,
            Err(e) => {
                warn!(worker_id, url, "fallback browser-per-task launch failed: {e}");
                hard_timeout_result(&url) // treat launch failure the same as a non-retryable crash for this task
            }
        };
        results.lock().await.push(result);
    }
}

async fn run_with_hard_timeout(
    browser: &Browser,
    url: &str,
    options: &PayloadOptions,
    page_config: &PageTaskConfig,
    hard_timeout: Duration,
) -> TaskResult {
    match tokio::time::timeout(hard_timeout, page_task::run(browser, url, options, page_config)).await {
        Ok(result) => result,
        Err(_) => hard_timeout_result(url),
    }
}

fn page_task_config(config: &BrowserConfig) -> PageTaskConfig {
    PageTaskConfig {
        soft_timeout: Duration::from_secs(config.soft_timeout_seconds),
        settle: Duration::from_secs(config.settle_seconds),
        crash_probe_hz: config.crash_probe_hz,
        user_agent: config.user_agent.clone(),
    }
}

/// The hard timeout must trigger independently of the soft one (§4.6); it
/// stays in the `timeout` category so the retry pass (C11) can pick it up.
fn hard_timeout_result(url: &str) -> TaskResult {
    let detailed = DetailedError {
        category: ErrorCategory::Timeout,
        sub_category: "hard".to_string(),
        phase: ErrorPhase::Navigation,
        code: "HARD_TIMEOUT".to_string(),
        url: url.to_string(),
        timestamp: Utc::now(),
        message: "hard timeout exceeded, page forcibly closed".to_string(),
    };
    TaskResult::Error {
        url: url.to_string(),
        code: detailed.code.clone(),
        message: detailed.message.clone(),
        stack: None,
        detailed: Some(detailed),
    }
}
