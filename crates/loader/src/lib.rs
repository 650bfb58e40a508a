pub mod error;
pub mod extract;
pub mod range;
pub mod remote;

use std::path::Path;

use tracing::warn;

pub use error::LoaderError;
pub use range::{apply_range, RangeResult};

/// Where the candidate URL list comes from (§4.1).
pub enum LoadSource<'a> {
    LocalFile(&'a Path),
    Remote(&'a str),
}

/// Optional early-stop / cap hints forwarded from the CLI.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub num_urls: Option<usize>,
    pub start_range: Option<u64>,
    pub end_range: Option<u64>,
}

pub struct UrlLoader {
    client: reqwest::Client,
}

impl Default for UrlLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlLoader {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    /// Load, normalize, dedup (order-preserving), and apply the loader-level
    /// early-stop hint. Canonicalization happens later at the tracker
    /// boundary, not here.
    pub async fn load(&self, source: LoadSource<'_>, opts: &LoadOptions) -> Result<Vec<String>, LoaderError> {
        let (raw, format_hint) = match source {
            LoadSource::LocalFile(path) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| LoaderError::SourceUnavailable(format!("{}: {e}", path.display())))?;
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_ascii_lowercase();
                (content, ext)
            }
            LoadSource::Remote(url) => {
                let content = remote::fetch(&self.client, url).await?;
                let ext = Path::new(url)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_ascii_lowercase();
                (content, ext)
            }
        };

        let mut urls = match format_hint.as_str() {
            "csv" => extract::parse_csv(&raw)?,
            "json" => extract::parse_json(&raw),
            _ => extract::parse_txt(&raw),
        };

        urls = extract::dedup(urls);

        if urls.is_empty() {
            warn!("URL source produced no URLs");
        }

        if let Some(end) = opts.end_range {
            let cap = end as usize;
            if urls.len() > cap {
                urls.truncate(cap);
            }
        }
        if let Some(n) = opts.num_urls {
            urls.truncate(n);
        }

        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_local_txt_file() {
        let dir = std::env::temp_dir().join(format!("adscan-loader-test-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("urls.txt");
        tokio::fs::write(&path, "https://a.com\nhttps://b.com\nhttps://a.com\n")
            .await
            .unwrap();

        let loader = UrlLoader::new();
        let urls = loader
            .load(LoadSource::LocalFile(&path), &LoadOptions::default())
            .await
            .unwrap();
        assert_eq!(urls, vec!["https://a.com".to_string(), "https://b.com".to_string()]);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_local_file_is_source_unavailable() {
        let loader = UrlLoader::new();
        let result = loader
            .load(LoadSource::LocalFile(Path::new("/nonexistent/path.txt")), &LoadOptions::default())
            .await;
        assert!(matches!(result, Err(LoaderError::SourceUnavailable(_))));
    }
}
