//! The model-call boundary.
//!
//! This is the ONLY fallible collaborator seam in the pipeline: scraping,
//! transcripts, notes, and upload all degrade to diagnostic text, but a model
//! invocation returns a real `Result` that every call site handles per
//! vendor. [`ModelClient`] is the trait the pipeline stages are written
//! against; [`OpenRouterClient`] is the production implementation.

mod openrouter;

use async_trait::async_trait;
use vendorwatch_shared::{ImageData, Result};

pub use openrouter::OpenRouterClient;

/// One model invocation: system instruction, user prompt, optional images.
#[derive(Debug, Clone)]
pub struct ModelRequest<'a> {
    /// System instruction steering tone and grounding.
    pub system: &'a str,
    /// The assembled user prompt.
    pub prompt: &'a str,
    /// Visual attachments (screenshots from the notes store).
    pub images: &'a [ImageData],
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional completion cap, for short outputs like delta summaries.
    pub max_tokens: Option<u32>,
}

impl<'a> ModelRequest<'a> {
    /// A text-only request with no completion cap.
    pub fn text(system: &'a str, prompt: &'a str, temperature: f32) -> Self {
        Self {
            system,
            prompt,
            images: &[],
            temperature,
            max_tokens: None,
        }
    }
}

/// Black-box text[, images] -> text model invocation.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run one completion. Fails with `VendorWatchError::Model`.
    async fn complete(&self, request: ModelRequest<'_>) -> Result<String>;
}
