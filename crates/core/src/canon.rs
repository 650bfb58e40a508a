use url::Url;

use crate::error::CoreError;

/// Canonicalize a URL per §3: lowercase scheme and host, strip default
/// ports, drop a bare trailing slash on host-only URLs, drop fragments.
///
/// This is the tracker's key boundary (§9 design note: canonicalize at
/// tracker entry and at classifier output only; elsewhere URLs carry the
/// form they were loaded in).
pub fn canonicalize_url(raw: &str) -> Result<String, CoreError> {
    let mut parsed = Url::parse(raw).map_err(|e| CoreError::InvalidUrl(format!("{raw}: {e}")))?;

    parsed.set_fragment(None);

    let scheme = parsed.scheme().to_ascii_lowercase();
    if let Some(host) = parsed.host_str() {
        let host = host.to_ascii_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| CoreError::InvalidUrl(format!("{raw}: {e}")))?;
    }
    parsed
        .set_scheme(&scheme)
        .map_err(|_| CoreError::InvalidUrl(format!("{raw}: unsupported scheme")))?;

    let is_default_port = match (parsed.scheme(), parsed.port()) {
        ("https", Some(443)) | ("http", Some(80)) => true,
        _ => false,
    };
    if is_default_port {
        let _ = parsed.set_port(None);
    }

    let mut canonical = parsed.to_string();
    if parsed.path() == "/" && parsed.query().is_none() {
        canonical.pop();
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!(
            canonicalize_url("HTTPS://Example.COM/Path").unwrap(),
            "https://example.com/Path"
        );
    }

    #[test]
    fn strips_default_port() {
        assert_eq!(
            canonicalize_url("https://example.com:443/a").unwrap(),
            "https://example.com/a"
        );
        assert_eq!(
            canonicalize_url("http://example.com:80/a").unwrap(),
            "http://example.com/a"
        );
    }

    #[test]
    fn keeps_non_default_port() {
        assert_eq!(
            canonicalize_url("https://example.com:8443/a").unwrap(),
            "https://example.com:8443/a"
        );
    }

    #[test]
    fn drops_fragment() {
        assert_eq!(
            canonicalize_url("https://example.com/a#section").unwrap(),
            "https://example.com/a"
        );
    }

    #[test]
    fn strips_trailing_slash_on_host_only() {
        assert_eq!(
            canonicalize_url("https://example.com/").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn keeps_trailing_slash_with_query() {
        assert_eq!(
            canonicalize_url("https://example.com/?a=1").unwrap(),
            "https://example.com/?a=1"
        );
    }

    #[test]
    fn rejects_malformed() {
        assert!(canonicalize_url("not a url").is_err());
    }
}
