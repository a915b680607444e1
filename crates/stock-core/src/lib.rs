//! Core of the stock agent
//!
//! Symbol resolution, the indicator engine, news sentiment scoring, signal
//! aggregation and the request pipeline. Data sources and language-model
//! services plug in through the traits re-exported here.

pub mod config;
pub mod context;
pub mod error;
pub mod indicators;
pub mod market;
pub mod pipeline;
pub mod sentiment;
pub mod signal;
pub mod symbol;

pub use config::{DEFAULT_HEADLINE_LIMIT, PipelineConfig};
pub use context::{
    CompanyProfile, ContextAggregator, Fundamentals, FundamentalsSource, Holdings, MacroSnapshot,
    MacroSource, MarketContext, PeerSnapshot,
};
pub use error::{Result, StockError};
pub use indicators::{CrossSignal, IndicatorSnapshot, compute_indicators};
pub use market::{LookbackPeriod, Market, PriceBar, PriceQuote, PriceSource, Symbol};
pub use pipeline::{AnalysisReport, Narrator, PriceHistory, StockPipeline, with_timeout};
pub use sentiment::{
    Headline, HeadlineClassifier, KeywordClassifier, NewsSource, SentimentLabel, SentimentReport,
    SentimentScore, SentimentScorer,
};
pub use signal::{Recommendation, SignalVerdict, aggregate_signal};
pub use symbol::{SymbolResolver, SymbolTable, resolve_symbol};
