pub mod dated;
pub mod error;
pub mod errors;
pub mod rewrite;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use adscan_core::{DetailedError, PageData};

pub use error::SinkError;

/// Bundles the output/error directory pair so callers don't thread two
/// paths through every write (§4.9, §6).
#[derive(Debug, Clone)]
pub struct ResultsSink {
    output_dir: PathBuf,
    error_dir: PathBuf,
}

impl ResultsSink {
    pub fn new(output_dir: impl Into<PathBuf>, error_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into(), error_dir: error_dir.into() }
    }

    pub async fn record_success(&self, pages: &[PageData]) -> Result<(), SinkError> {
        dated::append_pages(&self.output_dir, pages).await
    }

    pub async fn record_no_data(&self, url: &str) -> Result<(), SinkError> {
        errors::write_no_data(&self.error_dir, url).await
    }

    pub async fn record_error(&self, detailed: &DetailedError) -> Result<(), SinkError> {
        errors::write_error(&self.error_dir, detailed).await
    }

    pub async fn rewrite_txt_source<F>(
        &self,
        path: &Path,
        in_scope: &HashSet<String>,
        successfully_processed: &HashSet<String>,
        normalize: F,
    ) -> Result<(), SinkError>
    where
        F: Fn(&str) -> String,
    {
        rewrite::rewrite_txt_source(path, in_scope, successfully_processed, normalize).await
    }
}
