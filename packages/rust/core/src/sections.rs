//! Section extraction from free-text model responses.
//!
//! The model is asked for a fixed heading grammar, but the response is still
//! free text, so extraction is a small explicit state machine over lines
//! rather than string search scattered through call sites. The verbatim
//! response stays authoritative; extracted sections are a derived, lossy
//! index.

/// Extract the body under the heading containing `label` (case-insensitive).
///
/// A heading line opens capture; capture ends at the next heading line.
/// First match wins. Returns an empty string when the label never appears.
pub fn extract_section(text: &str, label: &str) -> String {
    let needle = label.to_lowercase();
    let mut capturing = false;
    let mut captured: Vec<&str> = Vec::new();

    for line in text.lines() {
        let is_heading = line.trim_start().starts_with("##");

        if capturing {
            if is_heading {
                break;
            }
            captured.push(line);
        } else if is_heading && line.to_lowercase().contains(&needle) {
            capturing = true;
        }
    }

    captured.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "\
## Recent Feature Launches & Updates
Shipped Agent Studio in July.

## Pricing Signals
New usage-based tier.
Enterprise plan repriced.
## Strategic Direction
All-in on agents.";

    #[test]
    fn captures_until_next_heading() {
        let body = extract_section(RESPONSE, "Pricing Signals");
        assert_eq!(body, "New usage-based tier.\nEnterprise plan repriced.");
    }

    #[test]
    fn captures_trimmed_body() {
        let body = extract_section(RESPONSE, "Recent Feature Launches");
        assert_eq!(body, "Shipped Agent Studio in July.");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let body = extract_section(RESPONSE, "pricing signals");
        assert!(body.contains("usage-based"));
    }

    #[test]
    fn absent_label_is_empty() {
        assert_eq!(extract_section(RESPONSE, "Gaps vs Your Product"), "");
    }

    #[test]
    fn trailing_section_captures_to_end() {
        let body = extract_section(RESPONSE, "Strategic Direction");
        assert_eq!(body, "All-in on agents.");
    }

    #[test]
    fn first_match_wins() {
        let text = "## Pricing Signals\nfirst\n## Other\nx\n## Pricing Signals\nsecond";
        assert_eq!(extract_section(text, "Pricing Signals"), "first");
    }

    #[test]
    fn heading_level_three_also_opens_capture() {
        let text = "### Pricing Signals\nbody line";
        assert_eq!(extract_section(text, "Pricing Signals"), "body line");
    }

    #[test]
    fn non_heading_mention_does_not_open_capture() {
        let text = "We discuss pricing signals below.\n## Pricing Signals\nreal body";
        assert_eq!(extract_section(text, "Pricing Signals"), "real body");
    }
}
