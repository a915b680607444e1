//! Fundamentals, holdings, peer comparison and macro context
//!
//! Everything gathered here is pass-through data for the narrative. Each part
//! is fetched independently; a failed part becomes a warning and the rest of
//! the context is still returned.

use crate::error::Result;
use crate::indicators::math::pct_change;
use crate::market::{LookbackPeriod, PriceSource, Symbol};
use crate::pipeline::with_timeout;
use crate::symbol::SymbolResolver;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Price multiples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_sales: Option<f64>,
}

/// Return and margin ratios, in percent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profitability {
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub operating_margin: Option<f64>,
    pub profit_margin: Option<f64>,
    pub gross_margin: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialHealth {
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
}

/// Year-over-year growth, in percent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Growth {
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherMetrics {
    pub market_cap: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    pub eps: Option<f64>,
    pub book_value: Option<f64>,
}

/// Company fundamentals grouped the way the report presents them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub valuation: Valuation,
    pub profitability: Profitability,
    pub financial_health: FinancialHealth,
    pub growth: Growth,
    pub other: OtherMetrics,
}

/// Ownership breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    pub institutional_percent: Option<f64>,
    pub insider_percent: Option<f64>,
    pub top_holders: Vec<String>,
    pub float_shares: Option<u64>,
    pub shares_outstanding: Option<u64>,
}

/// Fundamentals and ownership read from one company document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub fundamentals: Fundamentals,
    /// Absent when the source carries no ownership data
    pub holdings: Option<Holdings>,
}

/// Headline numbers for one comparable listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSnapshot {
    pub symbol: Symbol,
    pub last_close: f64,
    pub period_return: Option<f64>,
}

/// Macro indicators, all optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroSnapshot {
    pub fed_funds_rate: Option<f64>,
    pub treasury_10y: Option<f64>,
    pub treasury_2y: Option<f64>,
    /// 10Y minus 2Y, in percentage points
    pub yield_spread: Option<f64>,
    pub yield_curve_inverted: Option<bool>,
    pub unemployment_rate: Option<f64>,
    pub cpi: Option<f64>,
    pub vix: Option<f64>,
}

impl MacroSnapshot {
    /// Fill the spread and inversion flag from the two treasury yields
    pub fn with_derived_spread(mut self) -> Self {
        if let (Some(ten), Some(two)) = (self.treasury_10y, self.treasury_2y) {
            let spread = ten - two;
            self.yield_spread = Some(spread);
            self.yield_curve_inverted = Some(spread < 0.0);
        }
        self
    }
}

/// Everything gathered besides prices and news
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub fundamentals: Option<Fundamentals>,
    pub holdings: Option<Holdings>,
    pub peers: Vec<PeerSnapshot>,
    #[serde(rename = "macro")]
    pub macro_snapshot: Option<MacroSnapshot>,
}

impl MarketContext {
    pub fn is_empty(&self) -> bool {
        self.fundamentals.is_none()
            && self.holdings.is_none()
            && self.peers.is_empty()
            && self.macro_snapshot.is_none()
    }
}

/// Company-level fundamentals and ownership data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    /// Fundamentals and holdings for `symbol` in a single request
    async fn company_profile(&self, symbol: &Symbol) -> Result<CompanyProfile>;
}

/// Economy-wide indicators
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MacroSource: Send + Sync {
    async fn snapshot(&self) -> Result<MacroSnapshot>;
}

/// Collects the optional context for one request
#[derive(Clone)]
pub struct ContextAggregator {
    prices: Arc<dyn PriceSource>,
    fundamentals: Option<Arc<dyn FundamentalsSource>>,
    macro_source: Option<Arc<dyn MacroSource>>,
    resolver: SymbolResolver,
    call_timeout: Duration,
}

impl ContextAggregator {
    pub fn new(prices: Arc<dyn PriceSource>, call_timeout: Duration) -> Self {
        Self {
            prices,
            fundamentals: None,
            macro_source: None,
            resolver: SymbolResolver::default(),
            call_timeout,
        }
    }

    pub fn with_fundamentals(mut self, source: Arc<dyn FundamentalsSource>) -> Self {
        self.fundamentals = Some(source);
        self
    }

    pub fn with_macro(mut self, source: Arc<dyn MacroSource>) -> Self {
        self.macro_source = Some(source);
        self
    }

    /// Gather fundamentals, holdings, peers and macro data
    ///
    /// Returns the context plus one warning per part that failed.
    pub async fn collect(
        &self,
        symbol: &Symbol,
        period: LookbackPeriod,
    ) -> (MarketContext, Vec<String>) {
        let mut context = MarketContext::default();
        let mut warnings = Vec::new();

        if let Some(source) = &self.fundamentals {
            let profile = with_timeout(
                "company profile fetch",
                self.call_timeout,
                source.company_profile(symbol),
            )
            .await;
            match profile {
                Ok(profile) => {
                    context.fundamentals = Some(profile.fundamentals);
                    context.holdings = profile.holdings;
                }
                Err(e) => record(
                    &mut warnings,
                    format!("Fundamentals unavailable for {symbol}: {e}"),
                ),
            }
        }

        for peer in self.resolver.peers(symbol) {
            match self.peer_snapshot(&peer, period).await {
                Ok(Some(snapshot)) => context.peers.push(snapshot),
                Ok(None) => debug!(%peer, "Peer returned no bars"),
                Err(e) => record(&mut warnings, format!("Peer {peer} unavailable: {e}")),
            }
        }

        if let Some(source) = &self.macro_source {
            match with_timeout("macro fetch", self.call_timeout, source.snapshot()).await {
                Ok(snapshot) => context.macro_snapshot = Some(snapshot.with_derived_spread()),
                Err(e) => record(&mut warnings, format!("Macro data unavailable: {e}")),
            }
        }

        (context, warnings)
    }

    async fn peer_snapshot(
        &self,
        peer: &Symbol,
        period: LookbackPeriod,
    ) -> Result<Option<PeerSnapshot>> {
        let bars = with_timeout(
            "peer price fetch",
            self.call_timeout,
            self.prices.fetch_bars(peer, period),
        )
        .await?;
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Ok(None);
        };
        Ok(Some(PeerSnapshot {
            symbol: peer.clone(),
            last_close: last.close,
            period_return: pct_change(first.close, last.close),
        }))
    }
}

fn record(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StockError;
    use crate::market::MockPriceSource;
    use crate::market::fixtures::bars_from_closes;

    fn prices_with(closes: &'static [f64]) -> Arc<dyn PriceSource> {
        let mut prices = MockPriceSource::new();
        prices
            .expect_fetch_bars()
            .returning(move |_, _| Ok(bars_from_closes(closes)));
        Arc::new(prices)
    }

    #[test]
    fn test_macro_spread_and_inversion() {
        let snapshot = MacroSnapshot {
            treasury_10y: Some(4.1),
            treasury_2y: Some(4.6),
            ..Default::default()
        }
        .with_derived_spread();
        assert!((snapshot.yield_spread.unwrap() + 0.5).abs() < 1e-9);
        assert_eq!(snapshot.yield_curve_inverted, Some(true));

        let partial = MacroSnapshot {
            treasury_10y: Some(4.1),
            ..Default::default()
        }
        .with_derived_spread();
        assert_eq!(partial.yield_spread, None);
    }

    #[tokio::test]
    async fn test_collect_peers_only() {
        let aggregator =
            ContextAggregator::new(prices_with(&[100.0, 110.0]), Duration::from_secs(1));
        let (context, warnings) = aggregator
            .collect(&Symbol::new("005930.KS"), LookbackPeriod::OneMonth)
            .await;

        assert!(warnings.is_empty());
        assert!(context.fundamentals.is_none());
        assert_eq!(context.peers.len(), 1);
        assert_eq!(context.peers[0].symbol.as_str(), "000660.KS");
        assert_eq!(context.peers[0].last_close, 110.0);
        assert!((context.peers[0].period_return.unwrap() - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_profile_fetched_once_for_fundamentals_and_holdings() {
        let mut fundamentals = MockFundamentalsSource::new();
        fundamentals.expect_company_profile().times(1).returning(|_| {
            Ok(CompanyProfile {
                fundamentals: Fundamentals {
                    name: Some("Apple Inc".to_string()),
                    ..Default::default()
                },
                holdings: Some(Holdings {
                    institutional_percent: Some(61.2),
                    ..Default::default()
                }),
            })
        });

        let aggregator = ContextAggregator::new(prices_with(&[10.0]), Duration::from_secs(1))
            .with_fundamentals(Arc::new(fundamentals));
        let (context, warnings) = aggregator
            .collect(&Symbol::new("AAPL"), LookbackPeriod::OneMonth)
            .await;

        assert!(warnings.is_empty());
        assert_eq!(
            context.fundamentals.unwrap().name.as_deref(),
            Some("Apple Inc")
        );
        assert_eq!(context.holdings.unwrap().institutional_percent, Some(61.2));
    }

    #[tokio::test]
    async fn test_failures_become_warnings() {
        let mut fundamentals = MockFundamentalsSource::new();
        fundamentals
            .expect_company_profile()
            .returning(|_| Err(StockError::Api("HTTP 500".to_string())));

        let mut macro_source = MockMacroSource::new();
        macro_source.expect_snapshot().returning(|| {
            Ok(MacroSnapshot {
                vix: Some(14.2),
                ..Default::default()
            })
        });

        let aggregator = ContextAggregator::new(prices_with(&[10.0]), Duration::from_secs(1))
            .with_fundamentals(Arc::new(fundamentals))
            .with_macro(Arc::new(macro_source));

        let (context, warnings) = aggregator
            .collect(&Symbol::new("ZZZZ"), LookbackPeriod::ThreeMonths)
            .await;

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Fundamentals unavailable"));
        assert!(context.fundamentals.is_none());
        assert!(context.holdings.is_none());
        assert_eq!(context.macro_snapshot.unwrap().vix, Some(14.2));
        assert!(context.peers.is_empty());
    }

    #[test]
    fn test_empty_context() {
        assert!(MarketContext::default().is_empty());
    }
}
