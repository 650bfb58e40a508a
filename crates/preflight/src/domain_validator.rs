use once_cell::sync::Lazy;
use std::net::IpAddr;
use url::Url;

const RESERVED_TLDS: &[&str] = &["test", "example", "invalid", "localhost", "local"];

static BLOCKLIST_TOKENS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["example.com", "example.org", "example.net", "test.com", "localhost.localdomain"]);

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub allow_ip_literals: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self { allow_ip_literals: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Malformed,
    IpLiteral,
    ReservedTld,
    TooFewLabels,
    Blocklisted,
}

/// Cheap, synchronous, pattern-only rejection (§4.4) run before paying DNS
/// cost on clearly invalid candidates.
pub fn validate(raw_url: &str, config: &ValidatorConfig) -> Result<(), RejectReason> {
    let parsed = Url::parse(raw_url).map_err(|_| RejectReason::Malformed)?;
    let host = parsed.host_str().ok_or(RejectReason::Malformed)?;

    if host.parse::<IpAddr>().is_ok() && !config.allow_ip_literals {
        return Err(RejectReason::IpLiteral);
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return Err(RejectReason::TooFewLabels);
    }

    if let Some(tld) = labels.last() {
        if RESERVED_TLDS.contains(&tld.to_ascii_lowercase().as_str()) {
            return Err(RejectReason::ReservedTld);
        }
    }

    let host_lower = host.to_ascii_lowercase();
    if BLOCKLIST_TOKENS.iter().any(|token| host_lower == *token) {
        return Err(RejectReason::Blocklisted);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_normal_host() {
        assert!(validate("https://ads.example-publisher.com/page", &ValidatorConfig::default()).is_ok());
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(
            validate("not a url", &ValidatorConfig::default()).unwrap_err(),
            RejectReason::Malformed
        );
    }

    #[test]
    fn rejects_ip_literal_by_default() {
        assert_eq!(
            validate("https://1.2.3.4/", &ValidatorConfig::default()).unwrap_err(),
            RejectReason::IpLiteral
        );
    }

    #[test]
    fn allows_ip_literal_when_configured() {
        let cfg = ValidatorConfig { allow_ip_literals: true };
        assert!(validate("https://1.2.3.4/", &cfg).is_ok());
    }

    #[test]
    fn rejects_single_label_host() {
        assert_eq!(
            validate("https://localhost/", &ValidatorConfig::default()).unwrap_err(),
            RejectReason::TooFewLabels
        );
    }

    #[test]
    fn rejects_reserved_tld() {
        assert_eq!(
            validate("https://site.test/", &ValidatorConfig::default()).unwrap_err(),
            RejectReason::ReservedTld
        );
    }

    #[test]
    fn rejects_blocklisted_host() {
        assert_eq!(
            validate("https://example.com/", &ValidatorConfig::default()).unwrap_err(),
            RejectReason::Blocklisted
        );
    }
}
