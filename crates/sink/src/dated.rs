use std::path::{Path, PathBuf};

use adscan_core::PageData;
use chrono::NaiveDate;
use tracing::warn;

use crate::error::SinkError;

/// `<output_dir>/<Mon-YYYY>/<YYYY-MM-DD>.json` (§4.9, §6).
fn dated_path(output_dir: &Path, date: &str) -> Result<PathBuf, SinkError> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| SinkError::Other(anyhow::anyhow!("invalid PageData.date {date}: {e}")))?;
    let month_dir = parsed.format("%b-%Y").to_string();
    Ok(output_dir.join(month_dir).join(format!("{date}.json")))
}

/// Append successfully-extracted pages to the dated JSON file. Empty input
/// leaves the file untouched (§8 invariant 6: append idempotence).
pub async fn append_pages(output_dir: &Path, pages: &[PageData]) -> Result<(), SinkError> {
    if pages.is_empty() {
        return Ok(());
    }

    // All pages in one call share the same extraction day in normal
    // operation; group defensively in case a batch straddles midnight.
    use std::collections::HashMap;
    let mut by_date: HashMap<String, Vec<&PageData>> = HashMap::new();
    for page in pages {
        by_date.entry(page.date.clone()).or_default().push(page);
    }

    for (date, group) in by_date {
        let path = dated_path(output_dir, &date)?;
        append_group(&path, &group).await?;
    }
    Ok(())
}

async fn append_group(path: &Path, new_pages: &[&PageData]) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut existing: Vec<PageData> = match tokio::fs::read_to_string(path).await {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(pages) => pages,
            Err(e) => {
                warn!(path = %path.display(), "existing result file unparseable, overwriting: {e}");
                Vec::new()
            }
        },
        Err(_) => Vec::new(),
    };

    existing.extend(new_pages.iter().map(|p| (*p).clone()));

    let serialized = serde_json::to_string_pretty(&existing)
        .map_err(|e| SinkError::Other(anyhow::anyhow!("failed to serialize result file: {e}")))?;
    tokio::fs::write(path, serialized).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adscan_core::PrebidInstance;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("adscan-sink-test-{:?}", std::time::Instant::now()))
    }

    fn page(url: &str, date: &str) -> PageData {
        PageData {
            url: url.to_string(),
            date: date.to_string(),
            libraries: vec!["prebid".to_string()],
            prebid_instances: vec![PrebidInstance {
                global_var_name: "pbjs".to_string(),
                version: Some("8.0.0".to_string()),
                modules: vec!["appnexusBidAdapter".to_string()],
            }],
            identity_solutions: None,
            cdp_platforms: None,
            cmp_info: None,
            unknown_ad_tech: None,
            tool_metadata: None,
        }
    }

    #[tokio::test]
    async fn creates_file_and_appends_across_calls() {
        let dir = temp_dir();
        let p1 = page("https://a.com", "2026-03-05");
        append_pages(&dir, &[p1]).await.unwrap();

        let p2 = page("https://b.com", "2026-03-05");
        append_pages(&dir, &[p2]).await.unwrap();

        let path = dated_path(&dir, "2026-03-05").unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let pages: Vec<PageData> = serde_json::from_str(&content).unwrap();
        assert_eq!(pages.len(), 2);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn empty_batch_does_not_touch_file() {
        let dir = temp_dir();
        append_pages(&dir, &[]).await.unwrap();
        let path = dated_path(&dir, "2026-03-05").unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn recovers_from_unparseable_existing_file() {
        let dir = temp_dir();
        let path = dated_path(&dir, "2026-03-05").unwrap();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "not json").await.unwrap();

        let p = page("https://a.com", "2026-03-05");
        append_pages(&dir, &[p]).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let pages: Vec<PageData> = serde_json::from_str(&content).unwrap();
        assert_eq!(pages.len(), 1);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
