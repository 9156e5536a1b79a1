//! Stub collaborators and helpers shared across the core's tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use vendorwatch_fetch::{NotesStore, SourceFetcher, Uploader};
use vendorwatch_model::{ModelClient, ModelRequest};
use vendorwatch_shared::{NotesBundle, Result, VendorWatchError};
use vendorwatch_storage::Storage;

/// A canned multi-section model response matching the standard section set.
pub const MULTI_SECTION_RESPONSE: &str = "\
## Recent Feature Launches & Updates
Shipped Agent Studio in July.

## Pricing Signals
New usage-based tier.

## Strategic Direction
All-in on agents.

## Gaps vs Your Product
Their SSO story is weaker.";

/// Create a temp file storage for testing.
pub async fn temp_storage() -> Storage {
    let tmp = std::env::temp_dir().join(format!("vw_core_test_{}.db", uuid::Uuid::now_v7()));
    Storage::open(&tmp).await.expect("open test db")
}

/// Fetcher returning fixed text for every page and transcript request.
pub struct StubFetcher {
    pages: String,
    transcripts: String,
    page_calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new(pages: &str, transcripts: &str) -> Self {
        Self {
            pages: pages.into(),
            transcripts: transcripts.into(),
            page_calls: AtomicUsize::new(0),
        }
    }

    pub fn pages(pages: &str) -> Self {
        Self::new(pages, "")
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for StubFetcher {
    async fn fetch_pages(&self, _urls: &[String]) -> String {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.pages.clone()
    }

    async fn fetch_transcripts(&self, _channel: &str, _max_videos: usize) -> String {
        self.transcripts.clone()
    }
}

/// Notes store returning the same bundle for every vendor.
pub struct StaticNotes(pub NotesBundle);

#[async_trait]
impl NotesStore for StaticNotes {
    async fn read_notes(&self, _vendor_name: &str) -> NotesBundle {
        self.0.clone()
    }
}

/// Model stub with a call counter and a configurable failure point.
pub struct StubModel {
    response: String,
    /// Calls at or beyond this index fail. `usize::MAX` never fails.
    fail_from: usize,
    calls: AtomicUsize,
}

impl StubModel {
    /// Always succeeds with `response`.
    pub fn ok(response: &str) -> Self {
        Self {
            response: response.into(),
            fail_from: usize::MAX,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            fail_from: 0,
            calls: AtomicUsize::new(0),
        }
    }

    /// Succeeds for the first `successes` calls, then fails.
    pub fn fail_after(response: &str, successes: usize) -> Self {
        Self {
            response: response.into(),
            fail_from: successes,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for StubModel {
    async fn complete(&self, _request: ModelRequest<'_>) -> Result<String> {
        let call_index = self.calls.fetch_add(1, Ordering::SeqCst);
        if call_index >= self.fail_from {
            Err(VendorWatchError::model("stub failure"))
        } else {
            Ok(self.response.clone())
        }
    }
}

/// Uploader that is not configured (always returns an empty link).
pub struct EmptyUploader;

#[async_trait]
impl Uploader for EmptyUploader {
    async fn upload(&self, _markdown: &str, _filename: &str) -> String {
        String::new()
    }
}

/// Uploader returning a fixed link or diagnostic.
pub struct FixedUploader(pub String);

#[async_trait]
impl Uploader for FixedUploader {
    async fn upload(&self, _markdown: &str, _filename: &str) -> String {
        self.0.clone()
    }
}
