//! Anthropic Claude provider implementation
//!
//! See: https://docs.anthropic.com/en/api/messages

use crate::completion::{StopReason, TokenUsage};
use crate::messages::{ContentBlock, MessageContent, Role};
use crate::{CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: ANTHROPIC_API_BASE.to_string(),
        })
    }

    /// Reads the API key from the `ANTHROPIC_API_KEY` environment variable
    pub fn from_env(timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            LLMError::ConfigurationError(
                "ANTHROPIC_API_KEY environment variable not set".to_string(),
            )
        })?;
        Self::new(api_key, timeout)
    }

    /// Send requests to another Messages-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Anthropic API");

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                401 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(request.model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        debug!(
            stop_reason = %anthropic_response.stop_reason,
            input_tokens = anthropic_response.usage.input_tokens,
            output_tokens = anthropic_response.usage.output_tokens,
            "Received Anthropic response"
        );

        Ok(anthropic_response.into_completion())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    stop_reason: String,
    usage: TokenUsage,
}

impl AnthropicResponse {
    fn into_completion(self) -> CompletionResponse {
        CompletionResponse {
            message: Message {
                role: Role::Assistant,
                content: MessageContent::Blocks(self.content),
            },
            stop_reason: StopReason::from_api(&self.stop_reason),
            usage: self.usage,
        }
    }
}
