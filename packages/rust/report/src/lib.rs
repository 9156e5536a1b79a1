//! Deterministic markdown assembly for the final intelligence report.
//!
//! No model calls, no I/O, no clock reads: the timestamp is an explicit
//! input, so identical inputs produce byte-identical markdown. Consumers
//! (mailers, UIs) parse the report by heading text, which makes the literal
//! heading strings below a stable contract.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use vendorwatch_shared::SectionSpec;

/// Placeholder rendered for a section the extraction left empty.
const NO_DATA: &str = "_No data_";

/// Notice rendered when there are no deltas at all.
const FIRST_RUN_NOTICE: &str = "_This is the first run. No previous snapshot to compare against._";

/// One delta row as the renderer needs it.
#[derive(Debug, Clone)]
pub struct DeltaView<'a> {
    pub vendor_name: &'a str,
    pub summary: &'a str,
}

/// One synthesis as the renderer needs it.
#[derive(Debug, Clone)]
pub struct SynthesisView<'a> {
    pub vendor_name: &'a str,
    /// Extracted section bodies keyed by section key.
    pub sections: &'a BTreeMap<String, String>,
}

/// Everything the renderer consumes.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub research_query: &'a str,
    pub vendors: &'a [String],
    pub deltas: Vec<DeltaView<'a>>,
    pub syntheses: Vec<SynthesisView<'a>>,
    pub errors: &'a [String],
    pub sections: &'a [SectionSpec],
    pub generated_at: DateTime<Utc>,
}

/// Assemble the final report markdown.
///
/// Fixed section order: title block, "what's new", per-vendor detail,
/// then accumulated errors (only when any exist).
pub fn render_report(ctx: &ReportContext<'_>) -> String {
    let date = ctx.generated_at.format("%B %d, %Y");
    let time = ctx.generated_at.format("%H:%M");

    let mut lines: Vec<String> = vec![
        "# Competitive Intelligence Report".into(),
        format!("**Date:** {date} at {time}  "),
        format!("**Research Focus:** {}  ", ctx.research_query),
        format!("**Vendors Analyzed:** {}", ctx.vendors.join(", ")),
        String::new(),
        "---".into(),
        String::new(),
    ];

    // The delta section leads: what changed is what a reader opens this for
    lines.push("## What's New Since Last Run".into());
    lines.push(String::new());
    if ctx.deltas.is_empty() {
        lines.push(FIRST_RUN_NOTICE.into());
        lines.push(String::new());
    } else {
        for delta in &ctx.deltas {
            lines.push(format!("### {}", delta.vendor_name));
            lines.push(delta.summary.to_string());
            lines.push(String::new());
        }
    }

    lines.push("---".into());
    lines.push(String::new());
    lines.push("## Full Intelligence by Vendor".into());
    lines.push(String::new());

    for synthesis in &ctx.syntheses {
        lines.push(format!("## {}", synthesis.vendor_name));
        lines.push(String::new());
        for spec in ctx.sections {
            lines.push(format!("### {}", spec.label));
            let body = synthesis
                .sections
                .get(spec.key)
                .filter(|text| !text.trim().is_empty())
                .map(String::as_str)
                .unwrap_or(NO_DATA);
            lines.push(body.to_string());
            lines.push(String::new());
        }
        lines.push("---".into());
        lines.push(String::new());
    }

    if !ctx.errors.is_empty() {
        lines.push("## Errors During This Run".into());
        lines.push(String::new());
        for error in ctx.errors {
            lines.push(format!("- {error}"));
        }
    }

    lines.join("\n")
}

/// Upload filename for a report: date plus a slug of the research focus.
pub fn report_filename(research_query: &str, date: NaiveDate) -> String {
    let slug = slugify(research_query, 40);
    if slug.is_empty() {
        format!("competitive-intelligence-{date}")
    } else {
        format!("competitive-intelligence-{date}-{slug}")
    }
}

/// Lowercase, alphanumeric-and-dash, collapsed, bounded.
fn slugify(text: &str, max_chars: usize) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for ch in text.chars().take(max_chars) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}
