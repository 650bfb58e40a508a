use std::path::Path;

use adscan_core::DetailedError;
use tokio::io::AsyncWriteExt;

use crate::error::SinkError;

const NO_PREBID_FILE: &str = "no_prebid.txt";

async fn append_line(error_dir: &Path, file_name: &str, line: &str) -> Result<(), SinkError> {
    tokio::fs::create_dir_all(error_dir).await?;
    let path = error_dir.join(file_name);
    let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(&path).await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    Ok(())
}

/// `no_prebid.txt` lines are bare URLs (§6).
pub async fn write_no_data(error_dir: &Path, url: &str) -> Result<(), SinkError> {
    append_line(error_dir, NO_PREBID_FILE, url).await
}

/// Dispatched per `DetailedError.category` (§4.9, §6):
/// `[<ISO-8601 timestamp>] | Category: <cat>/<sub> | Phase: <phase> | Code: <code> | URL: <url> | Message: <msg>`
pub async fn write_error(error_dir: &Path, detailed: &DetailedError) -> Result<(), SinkError> {
    let line = format!(
        "[{}] | Category: {}/{} | Phase: {} | Code: {} | URL: {} | Message: {}",
        detailed.timestamp.to_rfc3339(),
        detailed.category.as_str(),
        detailed.sub_category,
        detailed.phase.as_str(),
        detailed.code,
        detailed.url,
        detailed.message,
    );
    append_line(error_dir, detailed.category.sink_file(), &line).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use adscan_core::{ErrorCategory, ErrorPhase};
    use chrono::Utc;

    fn temp_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("adscan-sink-errors-test-{:?}", std::time::Instant::now()))
    }

    #[tokio::test]
    async fn no_data_writes_bare_url() {
        let dir = temp_dir();
        write_no_data(&dir, "https://a.com").await.unwrap();
        let content = tokio::fs::read_to_string(dir.join("no_prebid.txt")).await.unwrap();
        assert_eq!(content.trim(), "https://a.com");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn error_routes_to_category_file() {
        let dir = temp_dir();
        let detailed = DetailedError {
            category: ErrorCategory::Timeout,
            sub_category: "navigation".to_string(),
            phase: ErrorPhase::Navigation,
            code: "TIMEOUT".to_string(),
            url: "https://a.com".to_string(),
            timestamp: Utc::now(),
            message: "Navigation timeout of 25000ms exceeded".to_string(),
        };
        write_error(&dir, &detailed).await.unwrap();
        let content = tokio::fs::read_to_string(dir.join("timeout_errors.txt")).await.unwrap();
        assert!(content.contains("Code: TIMEOUT"));
        assert!(content.contains("URL: https://a.com"));
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn appends_across_multiple_calls() {
        let dir = temp_dir();
        write_no_data(&dir, "https://a.com").await.unwrap();
        write_no_data(&dir, "https://b.com").await.unwrap();
        let content = tokio::fs::read_to_string(dir.join("no_prebid.txt")).await.unwrap();
        assert_eq!(content.lines().count(), 2);
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
