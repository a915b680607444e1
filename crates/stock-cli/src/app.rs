//! Wiring of data sources, model services and the pipeline

use crate::cli::Cli;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use stock_core::{HeadlineClassifier, KeywordClassifier, PipelineConfig, StockPipeline};
use stock_data::{AlphaVantageClient, FredClient, GoogleNewsClient, YahooFinanceClient};
use stock_llm::providers::AnthropicProvider;
use stock_llm::{Forecaster, LLMProvider, LlmHeadlineClassifier, LlmNarrator, ModelConfig};
use tracing::{info, warn};

/// Everything a command needs
pub struct App {
    pub pipeline: StockPipeline,
    /// Present only when a model is configured
    pub forecaster: Option<Forecaster>,
}

impl App {
    /// Build from flags and environment
    ///
    /// Missing optional keys only disable the matching feature.
    pub fn from_cli(cli: &Cli, narrative: bool) -> anyhow::Result<Self> {
        let mut builder = PipelineConfig::builder().with_env().narrative(narrative);
        if let Some(secs) = cli.timeout_secs {
            builder = builder.call_timeout(Duration::from_secs(secs));
        }
        let config = builder.build().context("Invalid pipeline configuration")?;
        let timeout = config.call_timeout;

        let model = ModelConfig::from_env().with_language(cli.language);
        let provider = model_provider(timeout);

        let classifier: Arc<dyn HeadlineClassifier> = match &provider {
            Some(provider) => Arc::new(LlmHeadlineClassifier::new(
                Arc::clone(provider),
                model.clone(),
            )),
            None => Arc::new(KeywordClassifier),
        };

        let news = GoogleNewsClient::new(timeout).context("Failed to build news client")?;
        let mut pipeline = StockPipeline::new(
            config,
            Arc::new(YahooFinanceClient::new()),
            Arc::new(news),
            classifier,
        );

        match AlphaVantageClient::from_env(timeout) {
            Ok(client) => pipeline = pipeline.with_fundamentals(Arc::new(client)),
            Err(e) => info!(reason = %e, "Fundamentals disabled"),
        }
        match FredClient::from_env(timeout) {
            Ok(client) => pipeline = pipeline.with_macro(Arc::new(client)),
            Err(e) => info!(reason = %e, "Macro indicators disabled"),
        }

        let (pipeline, forecaster) = match provider {
            Some(provider) => {
                let narrator = LlmNarrator::new(Arc::clone(&provider), model.clone());
                (
                    pipeline.with_narrator(Arc::new(narrator)),
                    Some(Forecaster::new(provider, model)),
                )
            }
            None => (pipeline, None),
        };

        Ok(Self { pipeline, forecaster })
    }
}

fn model_provider(timeout: Duration) -> Option<Arc<dyn LLMProvider>> {
    match AnthropicProvider::from_env(timeout) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            warn!(
                reason = %e,
                "No language model configured; using keyword sentiment and no narrative"
            );
            None
        }
    }
}
