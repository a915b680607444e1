//! Model selection and generation limits

use crate::prompts::Language;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Settings shared by the classifier, narrator and forecaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub language: Language,
    /// Output budget for narratives and forecasts
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            language: Language::English,
            max_tokens: 1500,
            temperature: 0.3,
        }
    }
}

impl ModelConfig {
    /// Defaults with the model taken from `ANTHROPIC_MODEL` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }
        config
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default().with_language(Language::Korean);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.language, Language::Korean);
        assert_eq!(config.with_model("claude-haiku").model, "claude-haiku");
    }
}
