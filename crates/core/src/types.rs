use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome recorded in the tracker for a canonical URL. See §3 UrlRecord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Success,
    NoData,
    ErrorTransient,
    ErrorPermanent,
}

impl RecordStatus {
    /// "Processed" for skip purposes: success, no_data, or error_permanent.
    pub fn is_processed(self) -> bool {
        matches!(
            self,
            RecordStatus::Success | RecordStatus::NoData | RecordStatus::ErrorPermanent
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Success => "success",
            RecordStatus::NoData => "no_data",
            RecordStatus::ErrorTransient => "error_transient",
            RecordStatus::ErrorPermanent => "error_permanent",
        }
    }
}

/// Row of the persistent tracker store keyed by canonical URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlRecord {
    pub url: String,
    pub status: RecordStatus,
    pub error_code: Option<String>,
    pub attempts: u32,
    pub first_seen: DateTime<Utc>,
    pub last_attempt: DateTime<Utc>,
}

/// A single Prebid.js binding observed on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebidInstance {
    pub global_var_name: String,
    pub version: Option<String>,
    /// Source order is meaningful; do not sort.
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrebidInitState {
    Complete,
    Partial,
    Queue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMetadata {
    #[serde(default)]
    pub prebid_init_states: HashMap<String, PrebidInitState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmpInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub tcf_version: Option<String>,
    pub gdpr_applies: Option<bool>,
    pub ccpa_applies: Option<bool>,
    pub consent_string: Option<String>,
}

/// The structured record extracted from a single rendered page. See §3 PageData.
///
/// `url` and `date` are filled in by the page task; everything else comes
/// from the in-page extraction payload's return value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub url: String,
    /// Extraction day, YYYY-MM-DD.
    pub date: String,
    /// Deduplicated, order not significant.
    pub libraries: Vec<String>,
    pub prebid_instances: Vec<PrebidInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_solutions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdp_platforms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmp_info: Option<CmpInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_ad_tech: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_metadata: Option<ToolMetadata>,
}

impl PageData {
    /// Success iff at least one library or one Prebid instance was found.
    pub fn is_success(&self) -> bool {
        !self.libraries.is_empty() || !self.prebid_instances.is_empty()
    }
}

/// Raw shape returned by the in-page extraction payload: everything in
/// `PageData` except `url` and `date`, which the page task fills in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadResult {
    #[serde(default)]
    pub libraries: Vec<String>,
    #[serde(default)]
    pub prebid_instances: Vec<PrebidInstance>,
    #[serde(default)]
    pub identity_solutions: Option<Vec<String>>,
    #[serde(default)]
    pub cdp_platforms: Option<Vec<String>>,
    #[serde(default)]
    pub cmp_info: Option<CmpInfo>,
    #[serde(default)]
    pub unknown_ad_tech: Option<Vec<String>>,
    #[serde(default)]
    pub tool_metadata: Option<ToolMetadata>,
}

impl PayloadResult {
    pub fn into_page_data(self, url: String, date: String) -> PageData {
        PageData {
            url,
            date,
            libraries: self.libraries,
            prebid_instances: self.prebid_instances,
            identity_solutions: self.identity_solutions,
            cdp_platforms: self.cdp_platforms,
            cmp_info: self.cmp_info,
            unknown_ad_tech: self.unknown_ad_tech,
            tool_metadata: self.tool_metadata,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Ssl,
    Timeout,
    Access,
    Content,
    Browser,
    Extraction,
    Other,
}

impl ErrorCategory {
    /// File name under `errors/` this category routes to. See §4.9 / §6.
    pub fn sink_file(self) -> &'static str {
        match self {
            ErrorCategory::Network => "navigation_errors.txt",
            ErrorCategory::Ssl => "ssl_errors.txt",
            ErrorCategory::Timeout => "timeout_errors.txt",
            ErrorCategory::Access => "access_errors.txt",
            ErrorCategory::Content => "content_errors.txt",
            ErrorCategory::Browser => "browser_errors.txt",
            ErrorCategory::Extraction => "extraction_errors.txt",
            ErrorCategory::Other => "error_processing.txt",
        }
    }

    /// Lowercase taxonomy string used in sink log lines (§7), matching the
    /// serde wire form rather than Rust's `Debug` PascalCase.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Ssl => "ssl",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Access => "access",
            ErrorCategory::Content => "content",
            ErrorCategory::Browser => "browser",
            ErrorCategory::Extraction => "extraction",
            ErrorCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPhase {
    Preflight,
    Navigation,
    Settle,
    Extraction,
    Teardown,
}

impl ErrorPhase {
    /// Lowercase taxonomy string used in sink log lines (§7), matching the
    /// serde wire form rather than Rust's `Debug` PascalCase.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorPhase::Preflight => "preflight",
            ErrorPhase::Navigation => "navigation",
            ErrorPhase::Settle => "settle",
            ErrorPhase::Extraction => "extraction",
            ErrorPhase::Teardown => "teardown",
        }
    }
}

/// Classifier output. Pure data — not a Rust `Error` impl — since it must
/// round-trip through JSON in the progress and error-sink files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedError {
    pub category: ErrorCategory,
    pub sub_category: String,
    pub phase: ErrorPhase,
    pub code: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl DetailedError {
    /// Permanence per spec.md §4.3's code table. `BROWSER_CRASH_NO_RETRY`
    /// and `PUPPETEER_MAIN_FRAME_ERROR` (§4.6 isolation) are sticky for the
    /// run that produced them even though the underlying browser condition
    /// may be transient on a later run.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self.code.as_str(),
            c if c.starts_with("DNS_RESOLUTION_FAILED")
                || c.starts_with("SSL_VALIDATION_FAILED")
                || c.starts_with("CERT_")
                || c == "NAME_NOT_RESOLVED"
                || c.starts_with("HTTP_4")
                || c.starts_with("HTTP_5")
                || c == "BROWSER_CRASH_NO_RETRY"
                || c == "PUPPETEER_MAIN_FRAME_ERROR"
                || c == "MAX_RETRIES_EXCEEDED"
        )
    }
}

/// Tagged union result of a single page task. See §3 TaskResult, §9 design note.
#[derive(Debug, Clone)]
pub enum TaskResult {
    Success { data: PageData },
    NoData { url: String },
    Error {
        url: String,
        code: String,
        message: String,
        stack: Option<String>,
        detailed: Option<DetailedError>,
    },
}

impl TaskResult {
    pub fn url(&self) -> &str {
        match self {
            TaskResult::Success { data } => &data.url,
            TaskResult::NoData { url } => url,
            TaskResult::Error { url, .. } => url,
        }
    }

    /// Whether this outcome belongs to the timeout error category, i.e. is
    /// eligible for the retry pass (C11).
    pub fn is_timeout_category(&self) -> bool {
        matches!(
            self,
            TaskResult::Error { detailed: Some(d), .. } if d.category == ErrorCategory::Timeout
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdUnitDetail {
    Basic,
    Standard,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleDetail {
    Simple,
    Categorized,
}

/// Tuning knobs forwarded verbatim to the in-page extraction payload. They
/// do not change the page task's state machine (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadOptions {
    pub discovery_mode: bool,
    pub extract_metadata: bool,
    pub ad_unit_detail: AdUnitDetail,
    pub module_detail: ModuleDetail,
    pub identity_detail: bool,
    pub prebid_config_detail: bool,
    pub identity_usage_detail: bool,
}

impl Default for PayloadOptions {
    fn default() -> Self {
        Self {
            discovery_mode: false,
            extract_metadata: false,
            ad_unit_detail: AdUnitDetail::Basic,
            module_detail: ModuleDetail::Simple,
            identity_detail: false,
            prebid_config_detail: false,
            identity_usage_detail: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipVerification {
    pub found_in_db: u64,
    pub missing_from_db: u64,
    pub missing_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatistics {
    pub urls_processed: u64,
    pub urls_skipped: u64,
    pub successful_extractions: u64,
    pub errors: u64,
    pub no_ad_tech: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_verification: Option<SkipVerification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedBatch {
    pub batch_number: u64,
    pub range: (u64, u64),
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub statistics: BatchStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedBatch {
    pub batch_number: u64,
    pub range: (u64, u64),
    pub failed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub statistics: BatchStatistics,
    pub error: String,
}

/// Persisted per-run batch state. See §3 BatchProgress, §4.10.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub start_url: u64,
    pub end_url: u64,
    pub batch_size: u64,
    pub start_time: DateTime<Utc>,
    pub completed_batches: Vec<CompletedBatch>,
    pub failed_batches: Vec<FailedBatch>,
}

impl BatchProgress {
    pub fn new(start_url: u64, end_url: u64, batch_size: u64) -> Self {
        Self {
            start_url,
            end_url,
            batch_size,
            start_time: Utc::now(),
            completed_batches: Vec::new(),
            failed_batches: Vec::new(),
        }
    }
}
