//! Request pipeline
//!
//! One request runs linearly: resolve, fetch prices, compute indicators,
//! gather context, score news, aggregate the verdict and optionally narrate.
//! Only the price fetch can fail the request; every other external call
//! degrades into a warning on the report.

use crate::config::PipelineConfig;
use crate::context::{ContextAggregator, FundamentalsSource, MacroSource, MarketContext};
use crate::error::{Result, StockError};
use crate::indicators::{IndicatorSnapshot, compute_indicators};
use crate::market::{LookbackPeriod, PriceBar, PriceQuote, PriceSource, Symbol};
use crate::sentiment::{Headline, HeadlineClassifier, NewsSource, SentimentReport, SentimentScorer};
use crate::signal::{SignalVerdict, aggregate_signal};
use crate::symbol::SymbolResolver;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Run `fut`, failing with [`StockError::Timeout`] if it takes longer than `after`
pub async fn with_timeout<T, F>(operation: &str, after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(StockError::Timeout {
            operation: operation.to_string(),
            after,
        }),
    }
}

/// Writes analyst commentary for a finished report
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, report: &AnalysisReport) -> Result<String>;
}

/// Structured result of one analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub query: String,
    pub symbol: Symbol,
    pub period: LookbackPeriod,
    pub quote: PriceQuote,
    pub snapshot: IndicatorSnapshot,
    pub sentiment: SentimentReport,
    pub context: MarketContext,
    pub verdict: SignalVerdict,
    pub narrative: Option<String>,
    /// Non-fatal problems hit while building the report
    pub warnings: Vec<String>,
}

/// Price history for a resolved query
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    pub symbol: Symbol,
    pub bars: Vec<PriceBar>,
}

/// Wires the data sources, scorer and narrator together
pub struct StockPipeline {
    config: PipelineConfig,
    resolver: SymbolResolver,
    prices: Arc<dyn PriceSource>,
    news: Arc<dyn NewsSource>,
    scorer: SentimentScorer,
    context: ContextAggregator,
    narrator: Option<Arc<dyn Narrator>>,
}

impl StockPipeline {
    pub fn new(
        config: PipelineConfig,
        prices: Arc<dyn PriceSource>,
        news: Arc<dyn NewsSource>,
        classifier: Arc<dyn HeadlineClassifier>,
    ) -> Self {
        let scorer = SentimentScorer::new(classifier, config.headline_limit, config.call_timeout);
        let context = ContextAggregator::new(Arc::clone(&prices), config.call_timeout);
        Self {
            config,
            resolver: SymbolResolver::default(),
            prices,
            news,
            scorer,
            context,
            narrator: None,
        }
    }

    pub fn with_fundamentals(mut self, source: Arc<dyn FundamentalsSource>) -> Self {
        self.context = self.context.with_fundamentals(source);
        self
    }

    pub fn with_macro(mut self, source: Arc<dyn MacroSource>) -> Self {
        self.context = self.context.with_macro(source);
        self
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolve `query` and fetch its bars
    ///
    /// A failed, timed-out or empty fetch is reported as
    /// [`StockError::DataUnavailable`].
    pub async fn history(&self, query: &str, period: LookbackPeriod) -> Result<PriceHistory> {
        let symbol = self.resolver.resolve(query);
        debug!(query, %symbol, %period, "Fetching price history");

        let bars = with_timeout(
            "price fetch",
            self.config.call_timeout,
            self.prices.fetch_bars(&symbol, period),
        )
        .await
        .map_err(|e| match e {
            StockError::DataUnavailable { .. } => e,
            other => StockError::unavailable(symbol.as_str(), other.to_string()),
        })?;

        if bars.is_empty() {
            return Err(StockError::unavailable(symbol.as_str(), "no price data returned"));
        }

        Ok(PriceHistory { symbol, bars })
    }

    /// Latest price against the previous close, over a 5-day lookback
    pub async fn quote(&self, query: &str) -> Result<PriceQuote> {
        let history = self.history(query, LookbackPeriod::FiveDays).await?;
        PriceQuote::from_bars(history.symbol.clone(), &history.bars)
            .ok_or_else(|| {
                StockError::unavailable(history.symbol.as_str(), "no price data returned")
            })
    }

    /// Indicator snapshot for `query` over `period`
    pub async fn indicators(
        &self,
        query: &str,
        period: LookbackPeriod,
    ) -> Result<(Symbol, IndicatorSnapshot)> {
        let history = self.history(query, period).await?;
        let snapshot = compute_indicators(&history.bars);
        Ok((history.symbol, snapshot))
    }

    /// Recent headlines for the company named by `query`
    pub async fn news(&self, query: &str) -> Result<Vec<Headline>> {
        let company = self.resolver.news_query(query);
        with_timeout(
            "news fetch",
            self.config.call_timeout,
            self.news.fetch_headlines(&company, self.config.headline_limit),
        )
        .await
    }

    /// Classify and score a list of headlines
    pub async fn score_headlines(&self, headlines: &[Headline]) -> SentimentReport {
        self.scorer.score(headlines).await
    }

    /// Full analysis of `query` over `period`
    #[instrument(skip(self), fields(symbol = tracing::field::Empty))]
    pub async fn analyze(&self, query: &str, period: LookbackPeriod) -> Result<AnalysisReport> {
        let PriceHistory { symbol, bars } = self.history(query, period).await?;
        tracing::Span::current().record("symbol", symbol.as_str());

        let quote = PriceQuote::from_bars(symbol.clone(), &bars)
            .ok_or_else(|| StockError::unavailable(symbol.as_str(), "no price data returned"))?;
        let snapshot = compute_indicators(&bars);

        let (context, mut warnings) = self.context.collect(&symbol, period).await;

        let headlines = match self.news(query).await {
            Ok(headlines) => headlines,
            Err(e) => {
                warn!(error = %e, "News unavailable, scoring without headlines");
                warnings.push(format!("News unavailable: {e}"));
                Vec::new()
            }
        };

        let sentiment = self.scorer.score(&headlines).await;
        if sentiment.skipped > 0 {
            warnings.push(format!(
                "{} headline(s) could not be classified and were left out of the sentiment score",
                sentiment.skipped
            ));
        }

        let verdict = aggregate_signal(&snapshot, sentiment.score, quote.change_percent);
        info!(
            recommendation = %verdict.recommendation,
            positive = verdict.positive_factors.len(),
            negative = verdict.negative_factors.len(),
            "Signal aggregated"
        );

        let mut report = AnalysisReport {
            query: query.to_string(),
            symbol,
            period,
            quote,
            snapshot,
            sentiment,
            context,
            verdict,
            narrative: None,
            warnings,
        };

        if self.config.narrative {
            if let Some(narrator) = &self.narrator {
                let narrative = with_timeout(
                    "narrative",
                    self.config.call_timeout,
                    narrator.narrate(&report),
                )
                .await;
                match narrative {
                    Ok(text) => report.narrative = Some(text),
                    Err(e) => {
                        warn!(error = %e, "Narrative generation failed");
                        report.warnings.push(format!("Narrative unavailable: {e}"));
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockPriceSource;
    use crate::market::fixtures::bars_from_closes;
    use crate::sentiment::{
        KeywordClassifier, MockHeadlineClassifier, MockNewsSource, SentimentLabel,
    };
    use crate::signal::Recommendation;

    fn rising_closes() -> Vec<f64> {
        (0..40).map(|i| 100.0 + i as f64).collect()
    }

    fn config() -> PipelineConfig {
        PipelineConfig::builder()
            .call_timeout(Duration::from_millis(200))
            .build()
            .unwrap()
    }

    fn prices_returning(closes: Vec<f64>) -> MockPriceSource {
        let mut prices = MockPriceSource::new();
        prices
            .expect_fetch_bars()
            .returning(move |_, _| Ok(bars_from_closes(&closes)));
        prices
    }

    fn news_returning(titles: &'static [&'static str]) -> MockNewsSource {
        let mut news = MockNewsSource::new();
        news.expect_fetch_headlines()
            .returning(move |_, limit| {
                Ok(titles.iter().take(limit).map(|t| Headline::new(*t)).collect())
            });
        news
    }

    struct SlowNews;

    #[async_trait]
    impl NewsSource for SlowNews {
        async fn fetch_headlines(&self, _company: &str, _limit: usize) -> Result<Vec<Headline>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_with_timeout_maps_elapsed() {
        let err = with_timeout("slow call", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, StockError::Timeout { .. }));
        assert!(err.to_string().contains("slow call timed out"));
    }

    #[tokio::test]
    async fn test_analyze_happy_path() {
        let pipeline = StockPipeline::new(
            config(),
            Arc::new(prices_returning(rising_closes())),
            Arc::new(news_returning(&["Apple beats estimates", "Apple wins contract"])),
            Arc::new(KeywordClassifier),
        );

        let report = pipeline.analyze("애플", LookbackPeriod::ThreeMonths).await.unwrap();

        assert_eq!(report.symbol.as_str(), "AAPL");
        assert_eq!(report.quote.current_price, 139.0);
        assert_eq!(report.sentiment.score.value(), 100.0);
        assert_eq!(report.context.peers.len(), 2);
        assert_eq!(report.verdict.recommendation, Recommendation::BuyLeaning);
        assert!(report.narrative.is_none());
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_empty_bars_are_data_unavailable() {
        let mut news = MockNewsSource::new();
        news.expect_fetch_headlines().never();

        let pipeline = StockPipeline::new(
            config(),
            Arc::new(prices_returning(Vec::new())),
            Arc::new(news),
            Arc::new(KeywordClassifier),
        );

        let err = pipeline.analyze("nothing", LookbackPeriod::OneMonth).await.unwrap_err();
        assert!(err.is_data_unavailable());
        assert!(err.to_string().contains("NOTHING"));
    }

    #[tokio::test]
    async fn test_fetch_error_is_data_unavailable() {
        let mut prices = MockPriceSource::new();
        prices
            .expect_fetch_bars()
            .returning(|_, _| Err(StockError::Api("HTTP 404".to_string())));

        let pipeline = StockPipeline::new(
            config(),
            Arc::new(prices),
            Arc::new(news_returning(&[])),
            Arc::new(KeywordClassifier),
        );

        let err = pipeline.quote("051910").await.unwrap_err();
        assert!(err.is_data_unavailable());
        assert!(err.to_string().contains("051910.KS"));
    }

    #[tokio::test]
    async fn test_news_timeout_degrades_to_warning() {
        let pipeline = StockPipeline::new(
            config(),
            Arc::new(prices_returning(rising_closes())),
            Arc::new(SlowNews),
            Arc::new(KeywordClassifier),
        );

        let report = pipeline.analyze("TSLA", LookbackPeriod::ThreeMonths).await.unwrap();

        assert_eq!(report.sentiment.score.value(), 0.0);
        assert!(report.warnings.iter().any(|w| w.contains("timed out")));
    }

    #[tokio::test]
    async fn test_narrator_runs_when_enabled() {
        let mut narrator = MockNarrator::new();
        narrator
            .expect_narrate()
            .times(1)
            .returning(|report| {
                Ok(format!(
                    "{} looks {}",
                    report.symbol, report.verdict.recommendation
                ))
            });

        let pipeline = StockPipeline::new(
            config(),
            Arc::new(prices_returning(rising_closes())),
            Arc::new(news_returning(&["Nvidia shares surge on record demand"])),
            Arc::new(KeywordClassifier),
        )
        .with_narrator(Arc::new(narrator));

        let report = pipeline.analyze("NVDA", LookbackPeriod::ThreeMonths).await.unwrap();
        assert_eq!(report.narrative.as_deref(), Some("NVDA looks buy-leaning"));
    }

    #[tokio::test]
    async fn test_narrator_failure_is_a_warning() {
        let mut narrator = MockNarrator::new();
        narrator
            .expect_narrate()
            .returning(|_| Err(StockError::Llm("overloaded".to_string())));

        let pipeline = StockPipeline::new(
            config(),
            Arc::new(prices_returning(rising_closes())),
            Arc::new(news_returning(&[])),
            Arc::new(KeywordClassifier),
        )
        .with_narrator(Arc::new(narrator));

        let report = pipeline.analyze("NVDA", LookbackPeriod::ThreeMonths).await.unwrap();
        assert!(report.narrative.is_none());
        assert!(report.warnings.iter().any(|w| w.contains("overloaded")));
    }

    #[tokio::test]
    async fn test_narrator_skipped_when_disabled() {
        let mut narrator = MockNarrator::new();
        narrator.expect_narrate().never();

        let config = PipelineConfig::builder().narrative(false).build().unwrap();
        let pipeline = StockPipeline::new(
            config,
            Arc::new(prices_returning(rising_closes())),
            Arc::new(news_returning(&[])),
            Arc::new(KeywordClassifier),
        )
        .with_narrator(Arc::new(narrator));

        let report = pipeline.analyze("NVDA", LookbackPeriod::ThreeMonths).await.unwrap();
        assert!(report.narrative.is_none());
    }

    #[tokio::test]
    async fn test_news_uses_english_company_name() {
        let mut news = MockNewsSource::new();
        news.expect_fetch_headlines()
            .withf(|company, limit| company == "Samsung Electronics" && *limit == 5)
            .times(1)
            .returning(|_, _| Ok(vec![Headline::new("삼성전자 실적 개선")]));

        let mut classifier = MockHeadlineClassifier::new();
        classifier
            .expect_classify()
            .returning(|_| Ok(SentimentLabel::Positive));

        let pipeline = StockPipeline::new(
            PipelineConfig::default(),
            Arc::new(prices_returning(rising_closes())),
            Arc::new(news),
            Arc::new(classifier),
        );

        let headlines = pipeline.news("삼성전자").await.unwrap();
        let report = pipeline.score_headlines(&headlines).await;
        assert_eq!(report.count(SentimentLabel::Positive), 1);
    }
}
