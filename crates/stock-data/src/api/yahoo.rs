//! Yahoo Finance price source

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stock_core::{LookbackPeriod, PriceBar, PriceSource, Result, StockError, Symbol};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

/// Daily bars from Yahoo Finance
#[derive(Debug, Clone, Copy, Default)]
pub struct YahooFinanceClient;

impl YahooFinanceClient {
    pub fn new() -> Self {
        Self
    }

    /// Daily bars between `start` and `end`, oldest first
    pub async fn history(
        &self,
        symbol: &Symbol,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>> {
        let provider = yahoo::YahooConnector::new().map_err(|e| yahoo_error(symbol, &e))?;

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| StockError::Other(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| StockError::Other(format!("Invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(symbol.as_str(), start_odt, end_odt)
            .await
            .map_err(|e| yahoo_error(symbol, &e))?;

        let quotes = response.quotes().map_err(|e| yahoo_error(symbol, &e))?;

        let mut bars: Vec<PriceBar> = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                to_bar(date, q.open, q.high, q.low, q.close, q.volume)
            })
            .collect();
        bars.sort_by_key(|bar| bar.date);
        Ok(bars)
    }
}

#[async_trait]
impl PriceSource for YahooFinanceClient {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch_bars(&self, symbol: &Symbol, period: LookbackPeriod) -> Result<Vec<PriceBar>> {
        let end = Utc::now();
        let start = end - chrono::Duration::days(period.days());
        let bars = self.history(symbol, start, end).await?;
        debug!(count = bars.len(), %period, "Fetched bars from Yahoo Finance");
        Ok(bars)
    }
}

/// Drop rows Yahoo pads with non-finite or non-positive closes
fn to_bar(
    date: chrono::NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
) -> Option<PriceBar> {
    if !close.is_finite() || close <= 0.0 {
        return None;
    }
    Some(PriceBar {
        date,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn yahoo_error(symbol: &Symbol, err: &yahoo::YahooError) -> StockError {
    StockError::unavailable(symbol.as_str(), format!("Yahoo Finance: {err}"))
}
