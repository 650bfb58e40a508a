use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::LoaderError;

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s"]+"#).unwrap());
static BARE_HOST_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([a-z0-9-_]+\.)+[a-z]{2,}(/.*)?$").unwrap());

/// One URL per line; trims, skips blanks, promotes bare hostnames to https://.
pub fn parse_txt(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(promote_scheme)
        .collect()
}

fn promote_scheme(line: &str) -> String {
    if line.starts_with("http://") || line.starts_with("https://") {
        line.to_string()
    } else if BARE_HOST_REGEX.is_match(line) {
        format!("https://{line}")
    } else {
        line.to_string()
    }
}

/// First column of each row; only `http(s)://`-prefixed entries are kept.
pub fn parse_csv(content: &str) -> Result<Vec<String>, LoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| LoaderError::Other(e.into()))?;
        if let Some(first) = record.get(0) {
            let trimmed = first.trim();
            if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
                out.push(trimmed.to_string());
            }
        }
    }
    Ok(out)
}

/// Structural parse collecting every string leaf matching the URL regex;
/// falls back to a raw regex scan if the document doesn't parse as JSON.
pub fn parse_json(content: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(content) {
        Ok(value) => {
            let mut out = Vec::new();
            collect_url_leaves(&value, &mut out);
            out
        }
        Err(_) => regex_scan(content),
    }
}

fn collect_url_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for m in URL_REGEX.find_iter(s) {
                out.push(m.as_str().to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_url_leaves(item, out);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                collect_url_leaves(v, out);
            }
        }
        _ => {}
    }
}

fn regex_scan(content: &str) -> Vec<String> {
    URL_REGEX
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Order-preserving dedup.
pub fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(urls.len());
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt_promotes_bare_hosts() {
        let out = parse_txt("example.com\nhttps://already.com/a\n\n  \nsub.example.org/path\n");
        assert_eq!(
            out,
            vec![
                "https://example.com".to_string(),
                "https://already.com/a".to_string(),
                "https://sub.example.org/path".to_string(),
            ]
        );
    }

    #[test]
    fn csv_keeps_only_http_first_column() {
        let out = parse_csv("https://a.com,other\nfoo,https://b.com\nhttp://c.com,x\n").unwrap();
        assert_eq!(
            out,
            vec!["https://a.com".to_string(), "http://c.com".to_string()]
        );
    }

    #[test]
    fn json_collects_nested_urls() {
        let doc = r#"{"sites":[{"url":"https://a.com"},"https://b.com/x"]}"#;
        let out = parse_json(doc);
        assert_eq!(out, vec!["https://a.com".to_string(), "https://b.com/x".to_string()]);
    }

    #[test]
    fn json_falls_back_to_regex_scan_on_parse_failure() {
        let out = parse_json("not json but has https://a.com/in/it embedded");
        assert_eq!(out, vec!["https://a.com/in/it".to_string()]);
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let out = dedup(vec!["a".into(), "b".into(), "a".into(), "c".into()]);
        assert_eq!(out, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }
}
