//! Error types for stock analysis operations
//!
//! Only failures that stop a request, or that an adapter must report, live here.
//! Short history and degenerate arithmetic never become errors: the affected
//! indicator is reported as absent (`None`) instead.

use std::time::Duration;
use thiserror::Error;

/// Stock analysis specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// Price data could not be fetched or came back empty
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Upstream API request failed
    #[error("API error: {0}")]
    Api(String),

    /// Rate limit exceeded for a provider
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    /// An external call did not finish in time
    #[error("{operation} timed out after {}s", after.as_secs_f64())]
    Timeout { operation: String, after: Duration },

    /// The classification or narrative service failed
    #[error("Language model error: {0}")]
    Llm(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl StockError {
    /// Shorthand for [`StockError::DataUnavailable`]
    pub fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error ends the request rather than degrading it
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StockError::unavailable("AAPL", "No data found");
        assert_eq!(err.to_string(), "Data not available for AAPL: No data found");
        assert!(err.is_data_unavailable());

        let err = StockError::Timeout {
            operation: "news fetch".to_string(),
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "news fetch timed out after 1.5s");
        assert!(!err.is_data_unavailable());
    }

    #[test]
    fn test_json_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: StockError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
