//! HTTP client for the chat backend.

use tracing::debug;
use url::Url;

use super::error::BackendError;
use super::types::{ChatRequest, ChatResponse};

/// HTTP client for the chat backend.
///
/// Requests are sent once and never retried. No timeout is configured, so a
/// call waits as long as the transport allows.
#[derive(Debug, Clone)]
pub struct RagClient {
    base_url: String,
    http: reqwest::Client,
}

impl RagClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The backend base URL (e.g., "http://localhost:8000")
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, BackendError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        http: reqwest::Client,
    ) -> Result<Self, BackendError> {
        let parsed = Url::parse(base_url.as_ref())?;
        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// The normalized base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the backend a question.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        let url = self.url("/api/chat");
        debug!(url = %url, top_k = request.top_k, "Posting chat request");

        let response = self.http.post(url).json(request).send().await?;
        Self::handle_response(response).await
    }

    /// Probe the backend's health endpoint.
    pub async fn health(&self) -> Result<(), BackendError> {
        let response = self.http.get(self.url("/api/health")).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::status_error(status, response).await)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn handle_response(response: reqwest::Response) -> Result<ChatResponse, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn status_error(status: reqwest::StatusCode, response: reqwest::Response) -> BackendError {
        let body = response.text().await.unwrap_or_default();
        let body = if body.trim().is_empty() {
            status.to_string()
        } else {
            body
        };
        BackendError::Status {
            status: status.as_u16(),
            body,
        }
    }
}
