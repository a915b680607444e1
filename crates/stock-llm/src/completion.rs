//! Single-turn completion requests and their results
//!
//! Every call this crate makes is one system prompt plus one user prompt, so
//! requests are built from a [`ModelConfig`] and the two texts.

use crate::Message;
use crate::config::ModelConfig;
use serde::{Deserialize, Serialize};

/// Body of a Messages API call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub max_tokens: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Empty request carrying the model and generation limits of `config`
    pub fn for_model(config: &ModelConfig) -> Self {
        Self {
            model: config.model.clone(),
            messages: Vec::new(),
            system: None,
            max_tokens: config.max_tokens,
            temperature: Some(config.temperature),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Append a user turn
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.messages.push(Message::user(prompt));
        self
    }

    /// Override the output budget and sampling temperature
    pub fn with_limits(mut self, max_tokens: usize, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = Some(temperature);
        self
    }

    /// Text of the first user turn, empty when there is none
    pub fn prompt(&self) -> String {
        self.messages.first().map(Message::text).unwrap_or_default()
    }
}

/// Why generation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
}

impl StopReason {
    /// Map the API's `stop_reason` string; unknown values count as a normal end
    pub fn from_api(reason: &str) -> Self {
        match reason {
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}

/// Assistant reply with its stop reason and token accounting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub message: Message,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Trimmed text of the assistant message
    pub fn text(&self) -> String {
        self.message.text().trim().to_string()
    }

    /// The reply was cut off by the output budget
    pub fn is_truncated(&self) -> bool {
        self.stop_reason == StopReason::MaxTokens
    }
}
