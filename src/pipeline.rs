use std::sync::Arc;

use adscan_batch::BatchPipeline;
use adscan_core::config::BrowserConfig as BrowserConfigSection;
use adscan_core::{DetailedError, ErrorCategory, ErrorPhase, Outcome, PayloadOptions, RecordStatus, TaskResult};
use adscan_preflight::{run_preflight, validate, CheckerConfig, RejectReason, ValidatorConfig};
use adscan_sink::ResultsSink;
use adscan_tracker::Tracker;
use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

/// Everything the pipeline needs besides tracker/sink, mirrored from
/// `AppConfig` plus the CLI flags that govern filtering policy.
pub struct ScanPipelineConfig {
    pub skip_processed: bool,
    pub force_reprocess: bool,
    pub preflight_check: bool,
    pub skip_dns_failed: bool,
    pub skip_ssl_failed: bool,
    pub max_retries: u32,
    pub headless: bool,
    pub browser: BrowserConfigSection,
    pub checker: CheckerConfig,
    pub validator: ValidatorConfig,
}

/// Binds C3-C9 together behind `BatchPipeline`, the seam C10/C11 in
/// `adscan-batch` are generic over.
pub struct ScanPipeline {
    pub tracker: Arc<Tracker>,
    pub sink: Arc<ResultsSink>,
    pub config: ScanPipelineConfig,
    pub payload_options: PayloadOptions,
}

impl ScanPipeline {
    async fn run(&self, urls: &[String], concurrency: usize, browser: &BrowserConfigSection) -> anyhow::Result<Vec<TaskResult>> {
        let mut results = Vec::new();

        let candidates = if self.config.skip_processed && !self.config.force_reprocess {
            self.tracker.filter_unprocessed(urls).await?
        } else {
            urls.to_vec()
        };

        let (valid, rejected): (Vec<String>, Vec<(String, RejectReason)>) = {
            let mut valid = Vec::with_capacity(candidates.len());
            let mut rejected = Vec::new();
            for url in candidates {
                match validate(&url, &self.config.validator) {
                    Ok(()) => valid.push(url),
                    Err(reason) => rejected.push((url, reason)),
                }
            }
            (valid, rejected)
        };
        for (url, reason) in rejected {
            results.push(self.reject_url(&url, reason).await);
        }

        let mut ready = Vec::with_capacity(valid.len());
        for url in valid {
            if let Some(result) = self.check_retry_ceiling(&url).await? {
                results.push(result);
            } else {
                ready.push(url);
            }
        }

        if self.config.preflight_check {
            ready = self.apply_preflight(ready, &mut results).await?;
        }

        let mut scaled_browser = browser.clone();
        scaled_browser.concurrency = concurrency;
        let pool = adscan_browser::BrowserPool::new(self.config.headless, scaled_browser);
        let browser_results = pool.run(ready, self.payload_options.clone()).await;

        for result in &browser_results {
            self.record(result).await;
        }
        results.extend(browser_results);

        Ok(results)
    }

    async fn reject_url(&self, url: &str, reason: RejectReason) -> TaskResult {
        let code = match reason {
            RejectReason::Malformed => "DOMAIN_REJECTED_MALFORMED",
            RejectReason::IpLiteral => "DOMAIN_REJECTED_IP_LITERAL",
            RejectReason::ReservedTld => "DOMAIN_REJECTED_RESERVED_TLD",
            RejectReason::TooFewLabels => "DOMAIN_REJECTED_TOO_FEW_LABELS",
            RejectReason::Blocklisted => "DOMAIN_REJECTED_BLOCKLISTED",
        };
        let detailed = DetailedError {
            category: ErrorCategory::Content,
            sub_category: "validation".to_string(),
            phase: ErrorPhase::Preflight,
            code: code.to_string(),
            url: url.to_string(),
            timestamp: Utc::now(),
            message: format!("domain validator rejected {url}: {reason:?}"),
        };
        self.persist_permanent_error(url, &detailed).await;
        TaskResult::Error {
            url: url.to_string(),
            code: detailed.code.clone(),
            message: detailed.message.clone(),
            stack: None,
            detailed: Some(detailed),
        }
    }

    async fn check_retry_ceiling(&self, url: &str) -> anyhow::Result<Option<TaskResult>> {
        let Some(record) = self.tracker.get_record(url).await? else {
            return Ok(None);
        };
        if record.status != RecordStatus::ErrorTransient || record.attempts < self.config.max_retries {
            return Ok(None);
        }
        let detailed = DetailedError {
            category: ErrorCategory::Other,
            sub_category: "retry_limit".to_string(),
            phase: ErrorPhase::Preflight,
            code: "MAX_RETRIES_EXCEEDED".to_string(),
            url: url.to_string(),
            timestamp: Utc::now(),
            message: format!("{url} exceeded {} retries this run", self.config.max_retries),
        };
        self.persist_permanent_error(url, &detailed).await;
        Ok(Some(TaskResult::Error {
            url: url.to_string(),
            code: detailed.code.clone(),
            message: detailed.message.clone(),
            stack: None,
            detailed: Some(detailed),
        }))
    }

    async fn apply_preflight(&self, urls: Vec<String>, results: &mut Vec<TaskResult>) -> anyhow::Result<Vec<String>> {
        let outcomes = run_preflight(&urls, &self.config.checker).await;
        let mut remaining = Vec::with_capacity(urls.len());
        for url in urls {
            let Some(outcome) = outcomes.get(&url) else {
                remaining.push(url);
                continue;
            };
            if !outcome.passed_dns && self.config.skip_dns_failed {
                let detailed = DetailedError {
                    category: ErrorCategory::Network,
                    sub_category: "dns".to_string(),
                    phase: ErrorPhase::Preflight,
                    code: "DNS_RESOLUTION_FAILED".to_string(),
                    url: url.clone(),
                    timestamp: Utc::now(),
                    message: outcome.warnings.join("; "),
                };
                self.persist_permanent_error(&url, &detailed).await;
                results.push(TaskResult::Error {
                    url: url.clone(),
                    code: detailed.code.clone(),
                    message: detailed.message.clone(),
                    stack: None,
                    detailed: Some(detailed),
                });
                continue;
            }
            if outcome.passed_ssl == Some(false) && self.config.skip_ssl_failed {
                let detailed = DetailedError {
                    category: ErrorCategory::Ssl,
                    sub_category: "validation".to_string(),
                    phase: ErrorPhase::Preflight,
                    code: "SSL_VALIDATION_FAILED".to_string(),
                    url: url.clone(),
                    timestamp: Utc::now(),
                    message: outcome.warnings.join("; "),
                };
                self.persist_permanent_error(&url, &detailed).await;
                results.push(TaskResult::Error {
                    url: url.clone(),
                    code: detailed.code.clone(),
                    message: detailed.message.clone(),
                    stack: None,
                    detailed: Some(detailed),
                });
                continue;
            }
            remaining.push(url);
        }
        Ok(remaining)
    }

    async fn persist_permanent_error(&self, url: &str, detailed: &DetailedError) {
        if let Err(e) = self.tracker.mark_result(url, Outcome::Error { code: detailed.code.clone(), permanent: true }).await {
            warn!(url, error = %e, "failed to mark permanent error in tracker");
        }
        if let Err(e) = self.sink.record_error(detailed).await {
            warn!(url, error = %e, "failed to write error sink entry");
        }
    }

    async fn record(&self, result: &TaskResult) {
        match result {
            TaskResult::Success { data } => {
                if let Err(e) = self.tracker.mark_result(&data.url, Outcome::Success).await {
                    warn!(url = %data.url, error = %e, "failed to mark success in tracker");
                }
                if let Err(e) = self.sink.record_success(std::slice::from_ref(data)).await {
                    warn!(url = %data.url, error = %e, "failed to append successful page data");
                }
            }
            TaskResult::NoData { url } => {
                if let Err(e) = self.tracker.mark_result(url, Outcome::NoData).await {
                    warn!(url, error = %e, "failed to mark no-data in tracker");
                }
                if let Err(e) = self.sink.record_no_data(url).await {
                    warn!(url, error = %e, "failed to write no-data entry");
                }
            }
            TaskResult::Error { url, code, detailed, .. } => {
                let permanent = detailed.as_ref().map(|d| d.is_permanent()).unwrap_or(false);
                if let Err(e) = self.tracker.mark_result(url, Outcome::Error { code: code.clone(), permanent }).await {
                    warn!(url, error = %e, "failed to mark error in tracker");
                }
                if let Some(detailed) = detailed {
                    if let Err(e) = self.sink.record_error(detailed).await {
                        warn!(url, error = %e, "failed to write error sink entry");
                    }
                }
            }
        }
    }
}

#[async_trait]
impl BatchPipeline for ScanPipeline {
    async fn run_batch(&self, urls: &[String], concurrency: usize) -> anyhow::Result<Vec<TaskResult>> {
        let browser = self.config.browser.clone();
        self.run(urls, concurrency, &browser).await
    }

    async fn run_retry_batch(&self, urls: &[String]) -> anyhow::Result<Vec<TaskResult>> {
        let mut relaxed = self.config.browser.clone();
        relaxed.soft_timeout_seconds *= 2;
        relaxed.hard_timeout_seconds *= 3;
        let concurrency = self.config.browser.concurrency.min(3).max(1);
        self.run(urls, concurrency, &relaxed).await
    }
}
