use std::path::{Path, PathBuf};

use adscan_core::BatchProgress;
use tokio::io::AsyncWriteExt;

use crate::error::BatchError;

fn progress_path(progress_dir: &Path, start_url: u64, end_url: u64) -> PathBuf {
    progress_dir.join(format!("batch-progress-{start_url}-{end_url}.json"))
}

/// Load an existing progress file for `(start_url, end_url)`, or start a
/// fresh one (§3 BatchProgress, §4.10 resume support).
pub async fn load_or_new(progress_dir: &Path, start_url: u64, end_url: u64, batch_size: u64) -> Result<BatchProgress, BatchError> {
    let path = progress_path(progress_dir, start_url, end_url);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => serde_json::from_str(&content)
            .map_err(|e| BatchError::Progress(format!("unreadable progress file {}: {e}", path.display()))),
        Err(_) => Ok(BatchProgress::new(start_url, end_url, batch_size)),
    }
}

/// Atomic write: temp file + fsync + rename (§4.10 "writes ... atomically").
pub async fn persist(progress_dir: &Path, progress: &BatchProgress) -> Result<(), BatchError> {
    tokio::fs::create_dir_all(progress_dir)
        .await
        .map_err(|e| BatchError::Progress(format!("failed to create progress dir: {e}")))?;

    let path = progress_path(progress_dir, progress.start_url, progress.end_url);
    let temp_path = path.with_extension("json.tmp");

    let serialized = serde_json::to_string_pretty(progress)
        .map_err(|e| BatchError::Progress(format!("failed to serialize progress: {e}")))?;

    let mut file = tokio::fs::File::create(&temp_path)
        .await
        .map_err(|e| BatchError::Progress(format!("failed to create temp progress file: {e}")))?;
    file.write_all(serialized.as_bytes())
        .await
        .map_err(|e| BatchError::Progress(format!("failed to write progress: {e}")))?;
    file.sync_all()
        .await
        .map_err(|e| BatchError::Progress(format!("failed to sync progress file: {e}")))?;
    drop(file);

    tokio::fs::rename(&temp_path, &path)
        .await
        .map_err(|e| BatchError::Progress(format!("failed to rename progress file: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("adscan-batch-progress-test-{:?}", std::time::Instant::now()))
    }

    #[tokio::test]
    async fn new_progress_when_no_file_exists() {
        let dir = temp_dir();
        let progress = load_or_new(&dir, 1, 100, 50).await.unwrap();
        assert_eq!(progress.start_url, 1);
        assert_eq!(progress.end_url, 100);
        assert!(progress.completed_batches.is_empty());
    }

    #[tokio::test]
    async fn persists_and_reloads() {
        let dir = temp_dir();
        let mut progress = BatchProgress::new(1, 100, 50);
        progress.batch_size = 50;
        persist(&dir, &progress).await.unwrap();

        let reloaded = load_or_new(&dir, 1, 100, 50).await.unwrap();
        assert_eq!(reloaded.start_url, progress.start_url);
        assert_eq!(reloaded.end_url, progress.end_url);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
