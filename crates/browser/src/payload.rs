use adscan_core::PayloadOptions;

/// Opaque extraction payload, bundled as a data asset (§1, §6). The crawl
/// engine's only contract with it is the `PAYLOAD_OPTIONS_PLACEHOLDER`
/// parameter substitution and the `PayloadResult` JSON it returns.
const PAYLOAD_TEMPLATE: &str = include_str!("payload.js");

/// Build the script to inject, with `options` serialized in as the
/// payload's single argument (§4.7's tuning-knob forwarding).
pub fn render(options: &PayloadOptions) -> Result<String, serde_json::Error> {
    let serialized = serde_json::to_string(options)?;
    Ok(PAYLOAD_TEMPLATE.replace("PAYLOAD_OPTIONS_PLACEHOLDER", &serialized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_options_as_json() {
        let script = render(&PayloadOptions::default()).unwrap();
        assert!(script.contains("\"discoveryMode\":false"));
        assert!(!script.contains("PAYLOAD_OPTIONS_PLACEHOLDER"));
    }
}
