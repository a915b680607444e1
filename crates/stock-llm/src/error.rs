//! Error types for LLM operations

use stock_core::StockError;
use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[cfg(feature = "anthropic")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Prompt template failed to render
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<minijinja::Error> for LLMError {
    fn from(err: minijinja::Error) -> Self {
        LLMError::TemplateError(err.to_string())
    }
}

/// Surface language-model failures to the pipeline
impl From<LLMError> for StockError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::ConfigurationError(msg) => StockError::Config(msg),
            other => StockError::Llm(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_stock_error() {
        let err: StockError = LLMError::RateLimitExceeded("slow down".to_string()).into();
        assert!(matches!(err, StockError::Llm(_)));
        assert_eq!(err.to_string(), "Language model error: Rate limit exceeded: slow down");

        let err: StockError = LLMError::ConfigurationError("missing key".to_string()).into();
        assert!(matches!(err, StockError::Config(_)));
    }
}
