//! HTTP client for the messages API

use std::time::Duration;

use reqwest::{Client, StatusCode};

use super::error::ClaudeError;
use super::models::{ClaudeModel, CreateMessageRequest, Message, MessageResponse};

/// Blocking-free client holding the API key
pub struct ClaudeClient {
    client: Client,
    api_key: String,
}

impl ClaudeClient {
    const API_URL: &'static str = "https://api.anthropic.com/v1/messages";
    const API_VERSION: &'static str = "2023-06-01";
    /// Upper bound on one grading round trip
    const TIMEOUT: Duration = Duration::from_secs(120);
    /// Wait suggested when a 429 carries no usable retry-after header
    const DEFAULT_RETRY_AFTER: u64 = 60;

    pub fn new(api_key: String) -> Result<Self, ClaudeError> {
        let client = Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self { client, api_key })
    }

    /// Send one request and wait for the whole reply
    pub async fn send_message(
        &self,
        request: CreateMessageRequest,
    ) -> Result<MessageResponse, ClaudeError> {
        let response = self
            .client
            .post(Self::API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(Self::DEFAULT_RETRY_AFTER);
            return Err(ClaudeError::RateLimited { retry_after_seconds: retry_after });
        }
        if !status.is_success() {
            let message = match status {
                StatusCode::UNAUTHORIZED => "Invalid API key".to_string(),
                _ => response.text().await.unwrap_or_default(),
            };
            return Err(ClaudeError::ApiError { status: status.as_u16(), message });
        }

        let body = response.text().await?;
        let reply: MessageResponse = serde_json::from_str(&body)?;
        tracing::debug!(
            "Reply {} used {} input and {} output tokens",
            reply.id,
            reply.usage.input_tokens,
            reply.usage.output_tokens
        );
        if reply.is_truncated() {
            tracing::warn!("Reply {} hit the token limit; later sections may be missing", reply.id);
        }
        if reply.text().is_empty() {
            return Err(ClaudeError::EmptyResponse);
        }
        Ok(reply)
    }

    /// Check the key and the model with a minimal request
    pub async fn test_connection(&self, model: ClaudeModel) -> Result<(), ClaudeError> {
        let request = CreateMessageRequest::new(model, vec![Message::user("Hi")]).with_max_tokens(10);
        self.send_message(request).await?;
        Ok(())
    }
}
