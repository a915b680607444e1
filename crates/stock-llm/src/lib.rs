//! Language-model services for the stock agent
//!
//! This crate puts a hosted model behind the seams `stock-core` leaves open:
//!
//! - [`LlmHeadlineClassifier`] labels news headlines for the sentiment scorer
//! - [`LlmNarrator`] writes analyst commentary over a finished report
//! - [`Forecaster`] asks for a price target and parses the answer
//!
//! Prompts are bilingual (English and Korean) MiniJinja templates. Provider
//! implementations sit behind feature flags.

pub mod classifier;
pub mod completion;
pub mod config;
pub mod error;
pub mod forecast;
pub mod messages;
pub mod narrator;
pub mod prompts;
pub mod provider;

// Re-export main types
pub use classifier::LlmHeadlineClassifier;
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use config::{DEFAULT_MODEL, ModelConfig};
pub use error::{LLMError, Result};
pub use forecast::{Confidence, Direction, Forecast, ForecastHorizon, Forecaster, parse_forecast};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use narrator::LlmNarrator;
pub use prompts::Language;
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "anthropic")]
pub mod providers;
