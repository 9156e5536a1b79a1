//! Report upload: HTTP PUT of the rendered markdown to a configured endpoint.
//!
//! Same never-fails contract as the other collaborators: the returned string
//! is the shareable link on success, empty when upload is unconfigured, or a
//! bracketed diagnostic on failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};
use vendorwatch_shared::{Result, VendorWatchError};

use crate::Uploader;

/// PUT-based uploader for WebDAV-style or presigned endpoints.
pub struct HttpUploader {
    client: Client,
    endpoint: Option<String>,
    token: Option<String>,
}

impl HttpUploader {
    /// Build an uploader. `endpoint = None` disables upload entirely.
    pub fn new(endpoint: Option<String>, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VendorWatchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.filter(|e| !e.is_empty()),
            token,
        })
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, markdown: &str, filename: &str) -> String {
        let Some(endpoint) = &self.endpoint else {
            return String::new();
        };

        let url = format!("{}/{}.md", endpoint.trim_end_matches('/'), filename);

        let mut request = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/markdown")
            .body(markdown.to_string());

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                info!(%url, "report uploaded");
                url
            }
            Ok(response) => {
                warn!(%url, status = %response.status(), "report upload rejected");
                format!("[Upload failed: HTTP {}]", response.status())
            }
            Err(e) => {
                warn!(%url, error = %e, "report upload failed");
                format!("[Upload failed: {e}]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn unconfigured_upload_returns_empty_link() {
        let uploader = HttpUploader::new(None, None).unwrap();
        let link = uploader.upload("# Report", "report-2026-08-04").await;
        assert!(link.is_empty());
    }

    #[tokio::test]
    async fn successful_upload_returns_url() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/reports/intel-2026-08-04.md"))
            .and(header("content-type", "text/markdown"))
            .and(body_string_contains("# Report"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let uploader =
            HttpUploader::new(Some(format!("{}/reports", server.uri())), None).unwrap();
        let link = uploader.upload("# Report body", "intel-2026-08-04").await;

        assert_eq!(link, format!("{}/reports/intel-2026-08-04.md", server.uri()));
    }

    #[tokio::test]
    async fn rejected_upload_returns_diagnostic() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let uploader =
            HttpUploader::new(Some(format!("{}/reports", server.uri())), None).unwrap();
        let link = uploader.upload("# Report", "intel").await;

        assert!(link.starts_with("[Upload failed: HTTP 403"));
    }

    #[tokio::test]
    async fn bearer_token_is_attached() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(header("authorization", "Bearer sekrit"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let uploader = HttpUploader::new(
            Some(format!("{}/reports", server.uri())),
            Some("sekrit".into()),
        )
        .unwrap();
        let link = uploader.upload("body", "file").await;
        assert!(link.ends_with("/reports/file.md"));
    }
}
