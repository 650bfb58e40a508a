use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub check_dns: bool,
    pub check_ssl: bool,
    pub dns_concurrency: usize,
    pub ssl_concurrency: usize,
    pub dns_timeout: Duration,
    pub ssl_timeout: Duration,
}

/// Per-URL preflight outcome (§4.5).
#[derive(Debug, Clone, Default)]
pub struct PreflightResult {
    pub passed_dns: bool,
    pub passed_ssl: Option<bool>,
    pub warnings: Vec<String>,
    pub skip_reason: Option<&'static str>,
}

/// Bounded-concurrency DNS resolve, then (optionally) TLS handshake, per
/// §4.5. `skipDNSFailed`/`skipSSLFailed` policy is applied by the caller
/// (C10/the pipeline), not here — this returns raw pass/fail per URL.
pub async fn run_preflight(urls: &[String], config: &CheckerConfig) -> HashMap<String, PreflightResult> {
    let dns_results: HashMap<String, PreflightResult> = if config.check_dns {
        dns_phase(urls, config).await
    } else {
        urls.iter()
            .map(|u| (u.clone(), PreflightResult { passed_dns: true, ..Default::default() }))
            .collect()
    };

    if !config.check_ssl {
        return dns_results;
    }

    let dns_passed: Vec<String> = dns_results
        .iter()
        .filter(|(_, r)| r.passed_dns)
        .map(|(u, _)| u.clone())
        .collect();
    let ssl_results = ssl_phase(&dns_passed, config).await;

    let mut merged = dns_results;
    for (url, ssl) in ssl_results {
        if let Some(entry) = merged.get_mut(&url) {
            entry.passed_ssl = Some(ssl.0);
            entry.warnings.extend(ssl.1);
        }
    }
    merged
}

async fn dns_phase(urls: &[String], config: &CheckerConfig) -> HashMap<String, PreflightResult> {
    stream::iter(urls.iter().cloned())
        .map(|url| async move {
            let result = check_dns(&url, config.dns_timeout).await;
            (url, result)
        })
        .buffer_unordered(config.dns_concurrency.max(1))
        .collect()
        .await
}

async fn check_dns(url: &str, dns_timeout: Duration) -> PreflightResult {
    let host = match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(h) => h,
        None => {
            return PreflightResult {
                passed_dns: false,
                skip_reason: Some("DNS_RESOLUTION_FAILED"),
                warnings: vec!["could not extract host for DNS check".to_string()],
                ..Default::default()
            }
        }
    };
    let port = Url::parse(url).ok().and_then(|u| u.port_or_known_default()).unwrap_or(443);

    let lookup = timeout(dns_timeout, tokio::net::lookup_host((host.as_str(), port))).await;
    match lookup {
        Ok(Ok(mut addrs)) if addrs.next().is_some() => PreflightResult { passed_dns: true, ..Default::default() },
        Ok(Ok(_)) => PreflightResult {
            passed_dns: false,
            skip_reason: Some("DNS_RESOLUTION_FAILED"),
            warnings: vec![format!("no addresses resolved for {host}")],
            ..Default::default()
        },
        Ok(Err(e)) => {
            debug!(host = %host, "dns resolution failed: {e}");
            PreflightResult {
                passed_dns: false,
                skip_reason: Some("DNS_RESOLUTION_FAILED"),
                warnings: vec![format!("DNS resolution failed for {host}: {e}")],
                ..Default::default()
            }
        }
        Err(_) => PreflightResult {
            passed_dns: false,
            skip_reason: Some("DNS_RESOLUTION_FAILED"),
            warnings: vec![format!("DNS resolution timed out for {host}")],
            ..Default::default()
        },
    }
}

fn rustls_client_config() -> Arc<ClientConfig> {
    // Idempotent: ignore the error when a provider is already installed
    // (e.g. by reqwest's rustls-tls backend elsewhere in the process).
    let _ = rustls::crypto::ring::default_provider().install_default();

    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect(),
    };
    Arc::new(ClientConfig::builder().with_root_certificates(roots).with_no_client_auth())
}

async fn ssl_phase(urls: &[String], config: &CheckerConfig) -> HashMap<String, (bool, Vec<String>)> {
    let tls_config = rustls_client_config();
    stream::iter(urls.iter().cloned())
        .map(|url| {
            let tls_config = tls_config.clone();
            async move {
                let result = check_ssl(&url, tls_config, config.ssl_timeout).await;
                (url, result)
            }
        })
        .buffer_unordered(config.ssl_concurrency.max(1))
        .collect()
        .await
}

async fn check_ssl(url: &str, tls_config: Arc<ClientConfig>, ssl_timeout: Duration) -> (bool, Vec<String>) {
    let Some(parsed) = Url::parse(url).ok() else {
        return (false, vec!["could not parse URL for TLS check".to_string()]);
    };
    if parsed.scheme() != "https" {
        // Nothing to validate for plain http:// origins.
        return (true, Vec::new());
    }
    let Some(host) = parsed.host_str().map(str::to_string) else {
        return (false, vec!["no host for TLS check".to_string()]);
    };
    let port = parsed.port().unwrap_or(443);

    let attempt = timeout(ssl_timeout, async {
        let stream = TcpStream::connect((host.as_str(), port)).await?;
        let connector = TlsConnector::from(tls_config);
        let server_name = ServerName::try_from(host.clone())
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad server name"))?;
        connector.connect(server_name, stream).await?;
        Ok::<(), std::io::Error>(())
    })
    .await;

    match attempt {
        Ok(Ok(())) => (true, Vec::new()),
        Ok(Err(e)) => (false, vec![format!("TLS handshake failed for {host}: {e}")]),
        Err(_) => (false, vec![format!("TLS handshake timed out for {host}")]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dns_disabled_passes_everything() {
        let config = CheckerConfig {
            check_dns: false,
            check_ssl: false,
            dns_concurrency: 4,
            ssl_concurrency: 4,
            dns_timeout: Duration::from_secs(1),
            ssl_timeout: Duration::from_secs(1),
        };
        let results = run_preflight(&["https://a.com".to_string()], &config).await;
        assert!(results["https://a.com"].passed_dns);
        assert!(results["https://a.com"].passed_ssl.is_none());
    }

    #[tokio::test]
    async fn malformed_url_fails_dns() {
        let config = CheckerConfig {
            check_dns: true,
            check_ssl: false,
            dns_concurrency: 4,
            ssl_concurrency: 4,
            dns_timeout: Duration::from_millis(200),
            ssl_timeout: Duration::from_millis(200),
        };
        let results = run_preflight(&["not a url".to_string()], &config).await;
        assert!(!results["not a url"].passed_dns);
        assert_eq!(results["not a url"].skip_reason, Some("DNS_RESOLUTION_FAILED"));
    }
}
