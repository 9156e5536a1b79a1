//! End-to-end intelligence pipeline: collect (web → video → notes) →
//! synthesize → delta → render.
//!
//! Stages run strictly in sequence, each consuming the run record and
//! returning an extended copy. Every stage appends to the shared error list
//! rather than aborting; the only fatal failure is the render stage's
//! persistence step.

use tracing::{info, instrument};
use vendorwatch_fetch::{NotesStore, SourceFetcher, Uploader};
use vendorwatch_model::ModelClient;
use vendorwatch_storage::Storage;

use crate::run::{RunOptions, RunRecord, RunRequest};
use crate::{collect, delta, render, synthesize};

/// Everything a stage needs beyond the run record itself: the persistence
/// handle and the external collaborators, all behind their trait seams.
pub struct StageContext<'a> {
    pub storage: &'a Storage,
    pub fetcher: &'a dyn SourceFetcher,
    pub notes: &'a dyn NotesStore,
    pub model: &'a dyn ModelClient,
    pub uploader: &'a dyn Uploader,
    pub options: RunOptions,
}

impl<'a> StageContext<'a> {
    /// Context with default options.
    pub fn new(
        storage: &'a Storage,
        fetcher: &'a dyn SourceFetcher,
        notes: &'a dyn NotesStore,
        model: &'a dyn ModelClient,
        uploader: &'a dyn Uploader,
    ) -> Self {
        Self {
            storage,
            fetcher,
            notes,
            model,
            uploader,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn stage(&self, name: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _name: &str) {}
}

/// Run the full pipeline for one vendor set and research query.
///
/// Returns the final run record; its `errors` list should be surfaced as
/// warnings by the caller, but a partial report is still a report.
#[instrument(skip_all, fields(vendors = request.vendors.len(), query = %request.research_query))]
pub async fn run_pipeline(
    request: RunRequest,
    ctx: &StageContext<'_>,
    progress: &dyn ProgressReporter,
) -> vendorwatch_shared::Result<RunRecord> {
    info!(vendors = ?request.vendors, "starting intelligence run");

    let record = RunRecord::new(request);

    progress.stage("Collecting website and blog content");
    let record = collect::collect_web(record, ctx).await;

    progress.stage("Collecting video transcripts");
    let record = collect::collect_video(record, ctx).await;

    progress.stage("Reading scrapbook notes");
    let record = collect::collect_notes(record, ctx).await;

    progress.stage("Synthesizing per-vendor intelligence");
    let record = synthesize::synthesize(record, ctx).await;

    progress.stage("Comparing against previous snapshots");
    let record = delta::compute_deltas(record, ctx).await;

    progress.stage("Rendering and persisting the report");
    let record = render::render_and_persist(record, ctx).await?;

    info!(
        syntheses = record.syntheses.len(),
        deltas = record.deltas.len(),
        errors = record.errors.len(),
        "intelligence run complete"
    );

    Ok(record)
}
