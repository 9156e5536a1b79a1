//! Page scraping: fetch a URL and reduce it to LLM-readable text.
//!
//! The scrape contract never fails; a fetch or decode problem becomes a
//! `[Scrape error for <url>: ...]` diagnostic embedded in the returned text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use tracing::debug;
use vendorwatch_shared::{Result, VendorWatchError};

use crate::SourceFetcher;
use crate::transcript::{self, TranscriptConfig};

/// Marketing sites routinely refuse obvious bot user agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/120.0.0.0 Safari/537.36";

/// Cap per URL so one long page cannot swamp the model input.
const MAX_CHARS_PER_URL: usize = 8000;

/// HTTP collaborator backing both the web and video collection stages.
pub struct HttpFetcher {
    client: Client,
    transcripts: TranscriptConfig,
}

impl HttpFetcher {
    /// Build a fetcher with the given transcript source configuration.
    pub fn new(transcripts: TranscriptConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| VendorWatchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            transcripts,
        })
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch_pages(&self, urls: &[String]) -> String {
        let mut results = Vec::new();
        for url in urls {
            if url.is_empty() {
                continue;
            }
            let content = scrape_url(&self.client, url).await;
            results.push(format!("--- Source: {url} ---\n{content}"));
        }
        results.join("\n\n")
    }

    async fn fetch_transcripts(&self, channel: &str, max_videos: usize) -> String {
        transcript::fetch_channel_transcripts(&self.client, &self.transcripts, channel, max_videos)
            .await
    }
}

/// Fetch one URL and extract clean text; diagnostics inline on failure.
async fn scrape_url(client: &Client, url: &str) -> String {
    match try_scrape(client, url).await {
        Ok(text) => text,
        Err(e) => format!("[Scrape error for {url}: {e}]"),
    }
}

async fn try_scrape(client: &Client, url: &str) -> Result<String> {
    debug!(%url, "scraping page");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| VendorWatchError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(VendorWatchError::Network(format!("HTTP {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| VendorWatchError::Network(format!("body read failed: {e}")))?;

    Ok(page_text(&body))
}

/// Reduce raw HTML to trimmed markdown-ish text, capped per URL.
pub(crate) fn page_text(html: &str) -> String {
    let content_html = extract_content_html(html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec![
            "script", "style", "nav", "header", "footer", "aside", "form", "iframe", "noscript",
            "svg",
        ])
        .build();

    let markdown = converter
        .convert(&content_html)
        .unwrap_or_else(|_| content_html.clone());

    let clean = markdown
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    truncate_chars(&clean, MAX_CHARS_PER_URL)
}

/// Extract the main content HTML, stripping page chrome.
fn extract_content_html(html: &str) -> String {
    let doc = Html::parse_document(html);

    // Try semantic content containers in priority order
    let selectors = ["main", "article", "[role=\"main\"]", ".content"];

    for sel_str in &selectors {
        if let Ok(selector) = scraper::Selector::parse(sel_str) {
            if let Some(el) = doc.select(&selector).next() {
                return el.inner_html();
            }
        }
    }

    // Fallback: use <body> content
    if let Ok(body_sel) = scraper::Selector::parse("body") {
        if let Some(body) = doc.select(&body_sel).next() {
            return body.inner_html();
        }
    }

    html.to_string()
}

/// Truncate on a character boundary (byte slicing panics mid-codepoint).
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
