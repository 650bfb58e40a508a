/// Result of applying a 1-based inclusive range (§4.2) over a loaded sequence.
pub struct RangeResult {
    pub selected: Vec<String>,
    pub warnings: Vec<String>,
}

struct ParsedRange {
    start: Option<u64>,
    end: Option<u64>,
}

fn parse_range_str(range: &str) -> Option<ParsedRange> {
    let range = range.trim();
    if let Some(end_str) = range.strip_prefix('-') {
        let end = end_str.parse::<u64>().ok()?;
        return Some(ParsedRange { start: None, end: Some(end) });
    }
    match range.split_once('-') {
        Some((start_str, end_str)) => {
            let start = start_str.parse::<u64>().ok()?;
            let end = if end_str.is_empty() {
                None
            } else {
                Some(end_str.parse::<u64>().ok()?)
            };
            Some(ParsedRange { start: Some(start), end })
        }
        None => {
            // No dash at all is not a valid range form; reject.
            None
        }
    }
}

/// Apply a 1-based inclusive range string over `urls`. `None` means "no
/// range requested" and returns the full sequence unchanged.
pub fn apply_range(urls: &[String], range: Option<&str>) -> RangeResult {
    let Some(range_str) = range else {
        return RangeResult { selected: urls.to_vec(), warnings: Vec::new() };
    };

    let len = urls.len() as u64;
    let mut warnings = Vec::new();

    let Some(parsed) = parse_range_str(range_str) else {
        warnings.push(format!("invalid range '{range_str}', passing input through unchanged"));
        return RangeResult { selected: urls.to_vec(), warnings };
    };

    let start = parsed.start.unwrap_or(1).max(1);
    let end_given = parsed.end;
    let mut end = end_given.unwrap_or(len);

    if start > len {
        warnings.push(format!("range start {start} exceeds input length {len}, selecting nothing"));
        return RangeResult { selected: Vec::new(), warnings };
    }

    if let Some(given_end) = end_given {
        if start > given_end {
            warnings.push(format!(
                "range start {start} is greater than end {given_end}, treating as {start}-{len}"
            ));
            end = len;
        }
    }
    end = end.min(len);

    let selected = urls[(start - 1) as usize..end as usize].to_vec();
    RangeResult { selected, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("u{i}")).collect()
    }

    #[test]
    fn start_end_inclusive() {
        let r = apply_range(&seq(4), Some("1-3"));
        assert_eq!(r.selected, vec!["u1", "u2", "u3"]);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn open_ended_start() {
        let r = apply_range(&seq(5), Some("3-"));
        assert_eq!(r.selected, vec!["u3", "u4", "u5"]);
    }

    #[test]
    fn open_ended_end() {
        let r = apply_range(&seq(5), Some("-2"));
        assert_eq!(r.selected, vec!["u1", "u2"]);
    }

    #[test]
    fn start_beyond_length_is_empty_with_warning() {
        let r = apply_range(&seq(3), Some("10-20"));
        assert!(r.selected.is_empty());
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn start_greater_than_end_falls_back_to_rest_of_list() {
        let r = apply_range(&seq(5), Some("4-2"));
        assert_eq!(r.selected, vec!["u4", "u5"]);
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn invalid_numerics_pass_through() {
        let r = apply_range(&seq(3), Some("abc-def"));
        assert_eq!(r.selected, seq(3));
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn empty_list_boundary() {
        let r = apply_range(&seq(0), Some("1000000-"));
        assert!(r.selected.is_empty());
    }

    #[test]
    fn zero_dash_zero() {
        let r = apply_range(&seq(5), Some("0-0"));
        // start clamps to 1, end 0 < start 1 -> fallback to 1-len
        assert_eq!(r.selected, seq(5));
    }

    #[test]
    fn no_range_passes_through() {
        let r = apply_range(&seq(3), None);
        assert_eq!(r.selected, seq(3));
    }
}
