//! The terminal stage: render the markdown report, persist the run, upload.
//!
//! Rendering itself is pure (`vendorwatch-report`); this stage supplies the
//! timestamp, writes the report row and the per-vendor diff-log rows (the
//! snapshots the NEXT run's delta engine will read), and finally invokes the
//! upload collaborator. Persistence failures propagate to the caller; this
//! is the one fatal spot in the pipeline.

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};
use vendorwatch_report::{DeltaView, ReportContext, SynthesisView, render_report, report_filename};
use vendorwatch_storage::DiffEntry;

use crate::pipeline::StageContext;
use crate::run::{RunRecord, Stage};

/// Render, persist, and upload the final report.
#[instrument(skip_all, fields(syntheses = record.syntheses.len(), deltas = record.deltas.len()))]
pub async fn render_and_persist(
    mut record: RunRecord,
    ctx: &StageContext<'_>,
) -> vendorwatch_shared::Result<RunRecord> {
    let generated_at = Utc::now();
    let sections = vendorwatch_shared::sections_for(ctx.options.depth);

    let markdown = render_report(&ReportContext {
        research_query: &record.research_query,
        vendors: &record.vendors,
        deltas: record
            .deltas
            .iter()
            .map(|d| DeltaView {
                vendor_name: &d.vendor_name,
                summary: &d.summary,
            })
            .collect(),
        syntheses: record
            .syntheses
            .iter()
            .map(|s| SynthesisView {
                vendor_name: &s.vendor_name,
                sections: &s.sections,
            })
            .collect(),
        errors: &record.errors,
        sections,
        generated_at,
    });

    // Persist the report row first, then one snapshot per synthesis.
    // These become the "previous snapshot" side of the next run's deltas.
    let report_id = ctx
        .storage
        .insert_report(&record.research_query, &record.vendors, &markdown, "")
        .await?;

    for synthesis in &record.syntheses {
        let delta_summary = record
            .deltas
            .iter()
            .find(|d| d.vendor_name == synthesis.vendor_name)
            .map(|d| d.summary.clone())
            .unwrap_or_default();

        ctx.storage
            .insert_diff_entry(&DiffEntry {
                report_id: report_id.clone(),
                vendor_name: synthesis.vendor_name.clone(),
                delta_summary,
                new_snapshot: synthesis.full_text.clone(),
                content_hash: content_hash(&synthesis.full_text),
                created_at: generated_at,
            })
            .await?;
    }

    // Upload only after persistence succeeded; a diagnostic link is stored
    // in the record either way, the row only gets a real link
    let filename = report_filename(&record.research_query, generated_at.date_naive());
    let link = ctx.uploader.upload(&markdown, &filename).await;
    if !link.is_empty() && !link.starts_with('[') {
        let _ = ctx.storage.update_report_link(&report_id, &link).await;
    }

    info!(%report_id, link = %link, "report persisted");

    record.final_report = markdown;
    record.report_link = link;
    record.stage = Stage::ReportRendered;
    Ok(record)
}

/// SHA-256 hash of a snapshot, stored alongside it for cheap change checks.
fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
