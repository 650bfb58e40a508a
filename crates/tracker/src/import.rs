use std::path::Path;

use adscan_core::PageData;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::TrackerError;
use crate::store::Tracker;

/// Seed the tracker by scanning `PageData` JSON files under `store_root`
/// and marking each URL found as `success` (§4.3 importExistingResults).
pub async fn import_existing_results(tracker: &Tracker, store_root: &Path) -> Result<u64, TrackerError> {
    let mut urls = Vec::new();

    for entry in WalkDir::new(store_root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let content = match tokio::fs::read_to_string(entry.path()).await {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %entry.path().display(), "skipping unreadable result file: {e}");
                continue;
            }
        };
        match serde_json::from_str::<Vec<PageData>>(&content) {
            Ok(pages) => urls.extend(pages.into_iter().map(|p| p.url)),
            Err(e) => warn!(path = %entry.path().display(), "skipping malformed result file: {e}"),
        }
    }

    tracker.mark_all_success(&urls).await
}
