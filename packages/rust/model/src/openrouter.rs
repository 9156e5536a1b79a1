//! OpenRouter chat-completions client (OpenAI-compatible wire format).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vendorwatch_shared::{Result, VendorWatchError};

use crate::{ModelClient, ModelRequest};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// How much of an error body to carry into the diagnostic.
const ERROR_BODY_EXCERPT: usize = 300;

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

/// Plain text for text-only messages, content parts when images are attached.
#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Production [`ModelClient`] talking to OpenRouter.
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    /// Build a client for the given model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| VendorWatchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Point the client at a different API base (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_messages<'a>(request: &'a ModelRequest<'_>) -> Vec<Message<'a>> {
        let user_content = if request.images.is_empty() {
            MessageContent::Text(request.prompt)
        } else {
            let mut parts = vec![ContentPart::Text {
                text: request.prompt.to_string(),
            }];
            for image in request.images {
                parts.push(ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                });
            }
            MessageContent::Parts(parts)
        };

        vec![
            Message {
                role: "system",
                content: MessageContent::Text(request.system),
            },
            Message {
                role: "user",
                content: user_content,
            },
        ]
    }
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: Self::build_messages(&request),
        };

        debug!(
            model = %self.model,
            prompt_len = request.prompt.len(),
            images = request.images.len(),
            "model call"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VendorWatchError::model(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
            return Err(VendorWatchError::model(format!("HTTP {status}: {excerpt}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| VendorWatchError::model(format!("bad response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| VendorWatchError::model("response contained no choices"))
    }
}
