//! Video transcript fetching via the YouTube Data API and timedtext tracks.
//!
//! Mirrors the never-fails scrape contract: a missing API key, an unknown
//! channel, or a caption-less video all degrade to bracketed diagnostic text.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use vendorwatch_shared::{Result, VendorWatchError};

use crate::page::truncate_chars;

/// Cap per transcript so long keynotes stay within the prompt budget.
const MAX_TRANSCRIPT_CHARS: usize = 6000;

/// Where transcripts come from. The bases are overridable for tests.
#[derive(Debug, Clone)]
pub struct TranscriptConfig {
    /// Resolved API key, or `None` when the env var was unset.
    pub api_key: Option<String>,
    /// YouTube Data API base.
    pub api_base: String,
    /// Timedtext (caption track) endpoint base.
    pub timedtext_base: String,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://www.googleapis.com/youtube/v3".into(),
            timedtext_base: "https://video.google.com/timedtext".into(),
        }
    }
}

impl TranscriptConfig {
    /// Resolve the API key from the named environment variable.
    pub fn from_env(api_key_env: &str) -> Self {
        Self {
            api_key: std::env::var(api_key_env).ok().filter(|k| !k.is_empty()),
            ..Self::default()
        }
    }
}

/// A recent upload on a channel.
#[derive(Debug, Clone)]
struct VideoRef {
    id: String,
    title: String,
    published: String,
}

// ---------------------------------------------------------------------------
// API response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    #[serde(default)]
    title: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Fetch transcripts for the most recent `max_videos` uploads on a channel.
/// Returns concatenated labeled transcript text; never fails.
pub(crate) async fn fetch_channel_transcripts(
    client: &Client,
    config: &TranscriptConfig,
    channel: &str,
    max_videos: usize,
) -> String {
    if channel.is_empty() {
        return String::new();
    }

    let Some(api_key) = config.api_key.as_deref() else {
        return "[Video channel configured but no transcripts retrieved: \
                set the transcript API key to enable fetching]"
            .to_string();
    };

    let videos = match recent_videos(client, config, api_key, channel, max_videos).await {
        Ok(videos) => videos,
        Err(e) => return format!("[Transcript lookup error for {channel}: {e}]"),
    };

    if videos.is_empty() {
        return format!("[No recent videos found for {channel}]");
    }

    let mut results = Vec::new();
    for video in videos {
        let transcript = fetch_transcript(client, config, &video.id).await;
        let date = video.published.get(..10).unwrap_or(&video.published);
        results.push(format!("--- Video: {} ({}) ---\n{}", video.title, date, transcript));
    }

    results.join("\n\n")
}

/// Resolve a channel handle to an id, then list its most recent uploads.
async fn recent_videos(
    client: &Client,
    config: &TranscriptConfig,
    api_key: &str,
    channel: &str,
    max_videos: usize,
) -> Result<Vec<VideoRef>> {
    let channel_id = if channel.starts_with('@') {
        resolve_channel_handle(client, config, api_key, channel).await?
    } else {
        channel.to_string()
    };

    let url = format!(
        "{}/search?part=id,snippet&channelId={}&order=date&type=video&maxResults={}&key={}",
        config.api_base, channel_id, max_videos, api_key
    );

    let response: SearchResponse = get_json(client, &url).await?;

    Ok(response
        .items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.video_id?;
            let snippet = item.snippet.unwrap_or(SearchSnippet {
                title: String::new(),
                published_at: String::new(),
            });
            Some(VideoRef {
                id,
                title: snippet.title,
                published: snippet.published_at,
            })
        })
        .collect())
}

/// Resolve `@Handle` to a channel id via channel search.
async fn resolve_channel_handle(
    client: &Client,
    config: &TranscriptConfig,
    api_key: &str,
    handle: &str,
) -> Result<String> {
    let url = format!(
        "{}/search?part=id&type=channel&maxResults=1&q={}&key={}",
        config.api_base, handle, api_key
    );

    let response: SearchResponse = get_json(client, &url).await?;

    response
        .items
        .into_iter()
        .find_map(|item| item.id.channel_id)
        .ok_or_else(|| VendorWatchError::Network(format!("no channel found for {handle}")))
}

/// Fetch one video's caption track; diagnostics inline on failure.
async fn fetch_transcript(client: &Client, config: &TranscriptConfig, video_id: &str) -> String {
    debug!(%video_id, "fetching transcript");

    let url = format!("{}?lang=en&v={}", config.timedtext_base, video_id);

    let body = match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => body,
            Err(e) => return format!("[Transcript error: {e}]"),
        },
        Ok(response) => return format!("[Transcript error: HTTP {}]", response.status()),
        Err(e) => return format!("[Transcript error: {e}]"),
    };

    let text = timedtext_to_plain(&body);
    if text.is_empty() {
        return "[No transcript available for this video]".to_string();
    }

    truncate_chars(&text, MAX_TRANSCRIPT_CHARS)
}

async fn get_json<T: serde::de::DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| VendorWatchError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(VendorWatchError::Network(format!("HTTP {status}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| VendorWatchError::parse(format!("bad API response: {e}")))
}

/// Strip timedtext XML down to caption text on one line.
fn timedtext_to_plain(xml: &str) -> String {
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

    let without_tags = TAG_RE.replace_all(xml, " ");
    let decoded = without_tags
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
