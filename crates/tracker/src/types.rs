use serde::Serialize;

/// Outcome passed to `Tracker::mark_result`. Permanence for `Error` is
/// decided by the caller (normally the error classifier, §4.8), not the
/// tracker itself.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success,
    NoData,
    Error { code: String, permanent: bool },
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeAnalysis {
    pub total_in_range: u64,
    pub processed_count: u64,
    pub unprocessed_count: u64,
    pub processed_percentage: f64,
    pub is_fully_processed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeSuggestion {
    pub start: u64,
    pub end: u64,
    pub unprocessed_fraction: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    pub found_in_db: u64,
    pub missing_from_db: u64,
    pub missing_urls: Vec<String>,
}
