use crate::error::LoaderError;

/// Rewrite a hosted-git `/blob/` URL to its raw-content equivalent.
/// Non-matching URLs pass through unchanged.
pub fn rewrite_blob_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://github.com/") {
        if let Some(idx) = rest.find("/blob/") {
            let (repo_path, after) = rest.split_at(idx);
            let after = after.trim_start_matches("/blob/");
            return format!("https://raw.githubusercontent.com/{repo_path}/{after}");
        }
    }
    url.to_string()
}

pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<String, LoaderError> {
    let effective = rewrite_blob_url(url);
    let resp = client
        .get(&effective)
        .send()
        .await
        .map_err(|e| LoaderError::SourceUnavailable(format!("{effective}: {e}")))?;

    if !resp.status().is_success() {
        return Err(LoaderError::SourceUnavailable(format!(
            "{effective}: HTTP {}",
            resp.status()
        )));
    }

    resp.text()
        .await
        .map_err(|e| LoaderError::SourceUnavailable(format!("{effective}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_github_blob_url() {
        assert_eq!(
            rewrite_blob_url("https://github.com/acme/repo/blob/main/urls.txt"),
            "https://raw.githubusercontent.com/acme/repo/main/urls.txt"
        );
    }

    #[test]
    fn leaves_non_blob_urls_unchanged() {
        let raw = "https://raw.githubusercontent.com/acme/repo/main/urls.txt";
        assert_eq!(rewrite_blob_url(raw), raw);
    }
}
