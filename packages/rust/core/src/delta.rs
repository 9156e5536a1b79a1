//! The delta engine: compare each new synthesis against the vendor's most
//! recent persisted snapshot.
//!
//! First run for a vendor produces the fixed sentinel with no model call.
//! Any failure (model or snapshot lookup) produces a placeholder result; this
//! stage never drops a vendor, unlike the synthesizer.

use tracing::{info, warn};
use vendorwatch_model::ModelRequest;
use vendorwatch_storage::Snapshot;

use crate::pipeline::StageContext;
use crate::run::{DeltaResult, RunRecord, Stage};

/// Summary used when no prior snapshot exists. Never a model output.
pub const FIRST_RUN_SENTINEL: &str =
    "First run for this vendor: no previous snapshot to compare against.";

/// Summary used when the comparison could not be computed.
pub const DELTA_FAILURE_PLACEHOLDER: &str = "[Delta computation failed]";

const DELTA_SYSTEM: &str = "\
You are a competitive intelligence analyst. Your job is to compare two \
intelligence snapshots for the same competitor and identify only what is \
genuinely new, changed, or removed. Be concise and specific.";

const DELTA_TEMPERATURE: f32 = 0.1;

/// Keeps delta summaries within a short word budget.
const DELTA_MAX_TOKENS: u32 = 400;

/// Both snapshots are excerpted to this many chars in the prompt.
const SNAPSHOT_EXCERPT_CHARS: usize = 3000;

/// Compute one delta per synthesized vendor, in synthesis order.
pub async fn compute_deltas(mut record: RunRecord, ctx: &StageContext<'_>) -> RunRecord {
    let inputs: Vec<(String, String)> = record
        .syntheses
        .iter()
        .map(|s| (s.vendor_name.clone(), s.full_text.clone()))
        .collect();

    for (vendor_name, full_text) in inputs {
        let delta = match ctx.storage.latest_snapshot(&vendor_name).await {
            Ok(None) => DeltaResult {
                vendor_name,
                summary: FIRST_RUN_SENTINEL.to_string(),
                is_first_run: true,
            },
            Ok(Some(previous)) => {
                compare(&vendor_name, &previous, &full_text, ctx, &mut record.errors).await
            }
            Err(e) => {
                warn!(vendor = %vendor_name, error = %e, "snapshot lookup failed");
                record
                    .errors
                    .push(format!("Snapshot lookup failed for {vendor_name}: {e}"));
                DeltaResult {
                    vendor_name,
                    summary: DELTA_FAILURE_PLACEHOLDER.to_string(),
                    is_first_run: false,
                }
            }
        };
        record.deltas.push(delta);
    }

    info!(deltas = record.deltas.len(), "delta computation complete");
    record.stage = Stage::DeltasComputed;
    record
}

/// Ask the model what changed between the previous and current snapshot.
async fn compare(
    vendor_name: &str,
    previous: &Snapshot,
    current: &str,
    ctx: &StageContext<'_>,
    errors: &mut Vec<String>,
) -> DeltaResult {
    let prompt = build_delta_prompt(vendor_name, previous, current);

    let request = ModelRequest {
        system: DELTA_SYSTEM,
        prompt: &prompt,
        images: &[],
        temperature: DELTA_TEMPERATURE,
        max_tokens: Some(DELTA_MAX_TOKENS),
    };

    match ctx.model.complete(request).await {
        Ok(summary) => DeltaResult {
            vendor_name: vendor_name.to_string(),
            summary,
            is_first_run: false,
        },
        Err(e) => {
            warn!(vendor = %vendor_name, error = %e, "delta comparison failed");
            errors.push(format!("Delta comparison failed for {vendor_name}: {e}"));
            DeltaResult {
                vendor_name: vendor_name.to_string(),
                summary: DELTA_FAILURE_PLACEHOLDER.to_string(),
                is_first_run: false,
            }
        }
    }
}

fn build_delta_prompt(vendor_name: &str, previous: &Snapshot, current: &str) -> String {
    format!(
        "Competitor: {vendor_name}\n\n\
         PREVIOUS SNAPSHOT (from {}):\n{}\n\n\
         NEW SNAPSHOT (today):\n{}\n\n\
         Identify ONLY meaningful changes. Format your response as:\n\n\
         NEW: features, announcements, or capabilities that did not exist before.\n\
         CHANGED: things that shifted in pricing, positioning, messaging, or strategy.\n\
         DROPPED: topics or initiatives that appear deprioritized or removed.\n\n\
         If nothing meaningful changed, respond with: \
         \"No significant changes detected since last run.\"\n\
         Keep it under 200 words. Be specific, not generic.",
        previous.created_at.format("%Y-%m-%d"),
        excerpt(&previous.text),
        excerpt(current),
    )
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(SNAPSHOT_EXCERPT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
