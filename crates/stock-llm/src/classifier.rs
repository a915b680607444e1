//! Headline classification backed by a language model

use crate::config::ModelConfig;
use crate::prompts::{HEADLINE_CLASSIFIER_SYSTEM, HEADLINE_CLASSIFIER_USER};
use crate::{CompletionRequest, LLMProvider};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use stock_core::{HeadlineClassifier, Result, SentimentLabel};
use tracing::debug;

/// Labels headlines by asking the model for a one-word answer
pub struct LlmHeadlineClassifier {
    provider: Arc<dyn LLMProvider>,
    config: ModelConfig,
}

impl LlmHeadlineClassifier {
    pub fn new(provider: Arc<dyn LLMProvider>, config: ModelConfig) -> Self {
        Self { provider, config }
    }
}

#[async_trait]
impl HeadlineClassifier for LlmHeadlineClassifier {
    async fn classify(&self, headline: &str) -> Result<SentimentLabel> {
        let language = self.config.language;
        let request = CompletionRequest::for_model(&self.config)
            .with_system(HEADLINE_CLASSIFIER_SYSTEM.render(language, &json!({}))?)
            .with_prompt(
                HEADLINE_CLASSIFIER_USER.render(language, &json!({ "headline": headline }))?,
            )
            .with_limits(8, 0.0);

        let response = self.provider.complete(request).await?;
        let answer = response.text();
        let label = parse_label(&answer);
        debug!(headline, answer = %answer, %label, "Model classified headline");
        Ok(label)
    }
}

/// Interpret a model answer; anything unrecognised is neutral
pub fn parse_label(answer: &str) -> SentimentLabel {
    let first_word = answer
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .unwrap_or_default();

    if let Ok(label) = first_word.parse() {
        return label;
    }

    let lowered = answer.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lowered.contains(w));
    match (mentions(&["positive", "긍정"][..]), mentions(&["negative", "부정"][..])) {
        (true, false) => SentimentLabel::Positive,
        (false, true) => SentimentLabel::Negative,
        _ => SentimentLabel::Neutral,
    }
}
