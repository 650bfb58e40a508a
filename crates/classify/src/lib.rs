//! Deterministic mapping from raw error payloads to a `DetailedError` (§4.8).
//! Matchers are evaluated top to bottom; the first match wins.

use adscan_core::{DetailedError, ErrorCategory, ErrorPhase};
use chrono::Utc;

struct Matcher {
    needle: &'static str,
    category: ErrorCategory,
    sub_category: &'static str,
    code: &'static str,
}

const MATCHERS: &[Matcher] = &[
    Matcher {
        needle: "net::ERR_NAME_NOT_RESOLVED",
        category: ErrorCategory::Network,
        sub_category: "dns",
        code: "NAME_NOT_RESOLVED",
    },
    Matcher {
        needle: "Navigation timeout",
        category: ErrorCategory::Timeout,
        sub_category: "navigation",
        code: "TIMEOUT",
    },
    Matcher {
        needle: "Timeout",
        category: ErrorCategory::Timeout,
        sub_category: "navigation",
        code: "TIMEOUT",
    },
    Matcher {
        needle: "Protocol error",
        category: ErrorCategory::Browser,
        sub_category: "protocol",
        code: "PROTOCOL_ERROR",
    },
    Matcher {
        needle: "Session closed",
        category: ErrorCategory::Browser,
        sub_category: "session",
        code: "SESSION_CLOSED",
    },
    Matcher {
        needle: "Target closed",
        category: ErrorCategory::Browser,
        sub_category: "session",
        code: "SESSION_CLOSED",
    },
    Matcher {
        needle: "Execution context was destroyed",
        category: ErrorCategory::Extraction,
        sub_category: "frame",
        code: "DETACHED_FRAME",
    },
    Matcher {
        needle: "ECONNREFUSED",
        category: ErrorCategory::Network,
        sub_category: "connection",
        code: "ECONNREFUSED",
    },
    Matcher {
        needle: "ECONNRESET",
        category: ErrorCategory::Network,
        sub_category: "connection",
        code: "ECONNRESET",
    },
    Matcher {
        needle: "ETIMEDOUT",
        category: ErrorCategory::Network,
        sub_category: "connection",
        code: "ETIMEDOUT",
    },
];

/// Classify a raw error string. `phase` is the pipeline phase the error was
/// observed in (§7), supplied by the caller since the classifier itself is
/// pure and stateless.
pub fn classify(raw: &str, url: &str, phase: ErrorPhase) -> DetailedError {
    if let Some(code) = extract_cert_code(raw) {
        return DetailedError {
            category: ErrorCategory::Ssl,
            sub_category: "certificate".to_string(),
            phase,
            code,
            url: url.to_string(),
            timestamp: Utc::now(),
            message: raw.to_string(),
        };
    }

    for m in MATCHERS {
        if raw.contains(m.needle) {
            return DetailedError {
                category: m.category,
                sub_category: m.sub_category.to_string(),
                phase,
                code: m.code.to_string(),
                url: url.to_string(),
                timestamp: Utc::now(),
                message: raw.to_string(),
            };
        }
    }

    DetailedError {
        category: ErrorCategory::Other,
        sub_category: "unknown".to_string(),
        phase,
        code: "UNKNOWN_PROCESSING_ERROR".to_string(),
        url: url.to_string(),
        timestamp: Utc::now(),
        message: raw.to_string(),
    }
}

fn extract_cert_code(raw: &str) -> Option<String> {
    let idx = raw.find("net::ERR_CERT_")?;
    let rest = &raw[idx + "net::".len()..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '"' || c == ')')
        .unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

/// A navigation that completed with a non-2xx/3xx response is always an
/// error (spec's resolved Open Question, §9) — the response status is
/// checked by the page task before the extraction payload runs.
pub fn classify_http_status(status: u16, url: &str, phase: ErrorPhase) -> DetailedError {
    DetailedError {
        category: ErrorCategory::Content,
        sub_category: "http".to_string(),
        phase,
        code: format!("HTTP_{status}"),
        url: url.to_string(),
        timestamp: Utc::now(),
        message: format!("navigation completed with HTTP status {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dns_failure_is_permanent_network_dns() {
        let d = classify("net::ERR_NAME_NOT_RESOLVED", "https://a.com", ErrorPhase::Navigation);
        assert_eq!(d.category, ErrorCategory::Network);
        assert_eq!(d.sub_category, "dns");
        assert_eq!(d.code, "NAME_NOT_RESOLVED");
        assert!(d.is_permanent());
    }

    #[test]
    fn cert_error_extracts_specific_code() {
        let d = classify(
            "Failed to load resource: net::ERR_CERT_DATE_INVALID",
            "https://a.com",
            ErrorPhase::Navigation,
        );
        assert_eq!(d.category, ErrorCategory::Ssl);
        assert_eq!(d.code, "ERR_CERT_DATE_INVALID");
        assert!(d.is_permanent());
    }

    #[test]
    fn navigation_timeout_is_transient() {
        let d = classify("Navigation timeout of 25000 ms exceeded", "https://a.com", ErrorPhase::Navigation);
        assert_eq!(d.category, ErrorCategory::Timeout);
        assert_eq!(d.code, "TIMEOUT");
        assert!(!d.is_permanent());
    }

    #[test]
    fn protocol_error_is_browser_transient() {
        let d = classify("Protocol error (Page.navigate): Target closed", "https://a.com", ErrorPhase::Navigation);
        // "Protocol error" matcher precedes "Target closed" in the list, first match wins.
        assert_eq!(d.code, "PROTOCOL_ERROR");
    }

    #[test]
    fn connection_refused_is_network_connection() {
        let d = classify("connect ECONNREFUSED 1.2.3.4:443", "https://a.com", ErrorPhase::Navigation);
        assert_eq!(d.category, ErrorCategory::Network);
        assert_eq!(d.code, "ECONNREFUSED");
        assert!(!d.is_permanent());
    }

    #[test]
    fn unknown_message_falls_back() {
        let d = classify("something bizarre happened", "https://a.com", ErrorPhase::Extraction);
        assert_eq!(d.code, "UNKNOWN_PROCESSING_ERROR");
        assert_eq!(d.category, ErrorCategory::Other);
    }

    #[test]
    fn http_4xx_is_permanent_content_http() {
        let d = classify_http_status(404, "https://a.com", ErrorPhase::Navigation);
        assert_eq!(d.code, "HTTP_404");
        assert!(d.is_permanent());
    }

    #[test]
    fn http_5xx_is_permanent_content_http() {
        let d = classify_http_status(503, "https://a.com", ErrorPhase::Navigation);
        assert_eq!(d.code, "HTTP_503");
        assert!(d.is_permanent());
    }

    #[test]
    fn classifier_is_deterministic() {
        let a = classify("net::ERR_NAME_NOT_RESOLVED", "https://a.com", ErrorPhase::Navigation);
        let b = classify("net::ERR_NAME_NOT_RESOLVED", "https://a.com", ErrorPhase::Navigation);
        assert_eq!(a.category, b.category);
        assert_eq!(a.code, b.code);
    }
}
