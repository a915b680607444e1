//! Analyst commentary written over a finished analysis report

use crate::config::ModelConfig;
use crate::prompts::{ANALYST_SYSTEM, ANALYST_USER, indicator_rows, price_vars};
use crate::{CompletionRequest, LLMError, LLMProvider};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use stock_core::{AnalysisReport, Narrator, Result};
use tracing::{debug, instrument, warn};

/// Turns an [`AnalysisReport`] into prose using a language model
pub struct LlmNarrator {
    provider: Arc<dyn LLMProvider>,
    config: ModelConfig,
}

impl LlmNarrator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: ModelConfig) -> Self {
        Self { provider, config }
    }
}

#[async_trait]
impl Narrator for LlmNarrator {
    #[instrument(skip_all, fields(symbol = %report.symbol))]
    async fn narrate(&self, report: &AnalysisReport) -> Result<String> {
        let language = self.config.language;
        let request = CompletionRequest::for_model(&self.config)
            .with_system(ANALYST_SYSTEM.render(language, &json!({}))?)
            .with_prompt(ANALYST_USER.render(language, &report_vars(report))?);

        let response = self.provider.complete(request).await?;
        let text = response.text();
        if text.is_empty() {
            let err = LLMError::UnexpectedResponse("Model returned an empty narrative".to_string());
            return Err(err.into());
        }

        if response.is_truncated() {
            warn!(max_tokens = self.config.max_tokens, "Narrative hit the output budget");
        }
        debug!(chars = text.len(), tokens = response.usage.total(), "Narrative generated");
        Ok(text)
    }
}

fn report_vars(report: &AnalysisReport) -> Value {
    let (price, change) = price_vars(&report.quote);
    let headlines: Vec<Value> = report
        .sentiment
        .headlines
        .iter()
        .map(|h| json!({ "label": h.label.to_string(), "headline": h.headline }))
        .collect();
    // Only ever rendered as text, so a serialization failure just drops the block
    let context = if report.context.is_empty() {
        None
    } else {
        serde_json::to_string_pretty(&report.context).ok()
    };

    json!({
        "query": report.query,
        "symbol": report.symbol.as_str(),
        "price": price,
        "change": change,
        "period": report.period.as_str(),
        "indicators": indicator_rows(&report.snapshot),
        "recommendation": report.verdict.recommendation.to_string(),
        "positives": report.verdict.positive_factors,
        "negatives": report.verdict.negative_factors,
        "sentiment": report.sentiment.score.to_string(),
        "headlines": headlines,
        "context": context,
    })
}
