use adscan_core::{DetailedError, ErrorCategory, ErrorPhase};
use chrono::Utc;

/// Fatal isolation substrings (§4.6): a task hitting one of these does not
/// retry within the same run, regardless of the generic classifier's
/// transient/permanent call for the same wording elsewhere in the pipeline.
const FATAL_SUBSTRINGS: &[&str] = &[
    "Target closed",
    "Session closed",
    "Protocol error (",
    "Requesting main frame too early",
];

/// Checks `raw` against the isolation substring list. Returns `None` if it
/// isn't one of the fatal crash conditions, leaving it to the general C8
/// classifier.
pub fn classify_fatal(raw: &str, url: &str, phase: ErrorPhase) -> Option<DetailedError> {
    let code = if raw.contains("Requesting main frame too early") {
        "PUPPETEER_MAIN_FRAME_ERROR"
    } else if FATAL_SUBSTRINGS.iter().any(|s| raw.contains(s)) {
        "BROWSER_CRASH_NO_RETRY"
    } else {
        return None;
    };

    Some(DetailedError {
        category: ErrorCategory::Browser,
        sub_category: "crash".to_string(),
        phase,
        code: code.to_string(),
        url: url.to_string(),
        timestamp: Utc::now(),
        message: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_closed_is_no_retry_crash() {
        let d = classify_fatal("Protocol error (Page.navigate): Target closed", "https://a.com", ErrorPhase::Navigation)
            .unwrap();
        assert_eq!(d.code, "BROWSER_CRASH_NO_RETRY");
        assert!(d.is_permanent());
    }

    #[test]
    fn main_frame_too_early_is_puppeteer_error() {
        let d = classify_fatal("Requesting main frame too early!", "https://a.com", ErrorPhase::Navigation).unwrap();
        assert_eq!(d.code, "PUPPETEER_MAIN_FRAME_ERROR");
    }

    #[test]
    fn unrelated_message_is_not_fatal() {
        assert!(classify_fatal("net::ERR_NAME_NOT_RESOLVED", "https://a.com", ErrorPhase::Navigation).is_none());
    }
}
