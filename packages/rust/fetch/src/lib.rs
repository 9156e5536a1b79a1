//! Outward-facing source collaborators: page scraping, video transcripts,
//! scrapbook notes, and report upload.
//!
//! Everything in this crate honors the never-fails contract: failures are
//! embedded in the returned text as bracketed diagnostics and flow downstream
//! as ordinary (if useless) content. The pipeline never inspects them; only
//! the model boundary (`vendorwatch-model`) returns real errors.

mod notes;
mod page;
mod transcript;
mod upload;

use async_trait::async_trait;
use vendorwatch_shared::NotesBundle;

pub use notes::LocalNotesStore;
pub use page::HttpFetcher;
pub use transcript::TranscriptConfig;
pub use upload::HttpUploader;

/// Fetches raw text for the web and video collection stages.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Scrape a list of URLs and concatenate labeled results. Never fails.
    async fn fetch_pages(&self, urls: &[String]) -> String;

    /// Fetch transcripts for a channel's most recent videos. Never fails.
    async fn fetch_transcripts(&self, channel: &str, max_videos: usize) -> String;
}

/// Reads personal notes and screenshots for a vendor. Never fails.
#[async_trait]
pub trait NotesStore: Send + Sync {
    async fn read_notes(&self, vendor_name: &str) -> NotesBundle;
}

/// Publishes the rendered report somewhere shareable.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload the markdown under `filename`. Returns the link on success, an
    /// empty string when upload is not configured, or a bracketed diagnostic
    /// on failure. Never fails.
    async fn upload(&self, markdown: &str, filename: &str) -> String;
}
