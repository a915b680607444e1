//! Federal Reserve Economic Data (FRED) macro source
//!
//! API Key: Free registration at https://fred.stlouisfed.org/docs/api/api_key.html
//! Rate Limit: 120 requests per minute

use crate::error::{SharedRateLimiter, http_client, rate_limiter, status, transport};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use stock_core::{MacroSnapshot, MacroSource, Result, StockError};
use tracing::{debug, instrument, warn};

const FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred";
const PROVIDER: &str = "FRED";

pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 120;

/// FRED series IDs used by the macro snapshot
pub mod series {
    /// Federal Funds Effective Rate
    pub const FED_FUNDS_RATE: &str = "FEDFUNDS";
    /// 10-Year Treasury Constant Maturity Rate
    pub const TREASURY_10Y: &str = "DGS10";
    /// 2-Year Treasury Constant Maturity Rate
    pub const TREASURY_2Y: &str = "DGS2";
    pub const UNEMPLOYMENT_RATE: &str = "UNRATE";
    /// Consumer Price Index (All Urban), monthly
    pub const CPI: &str = "CPIAUCSL";
    /// VIX Volatility Index
    pub const VIX: &str = "VIXCLS";
}

/// One observation; FRED writes "." for a missing value
#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    pub date: String,
    pub value: String,
}

impl Observation {
    fn parsed(&self) -> Option<f64> {
        self.value.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

/// FRED API client
#[derive(Debug, Clone)]
pub struct FredClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl FredClient {
    pub fn new(
        api_key: impl Into<String>,
        requests_per_minute: u32,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            rate_limiter: rate_limiter(requests_per_minute),
        })
    }

    /// Create from `FRED_API_KEY`
    pub fn from_env(timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("FRED_API_KEY").map_err(|_| {
            StockError::Config("FRED_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key, DEFAULT_REQUESTS_PER_MINUTE, timeout)
    }

    /// Most recent `limit` observations, newest first
    pub async fn observations(&self, series_id: &str, limit: u32) -> Result<Vec<Observation>> {
        self.rate_limiter.until_ready().await;

        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{FRED_BASE_URL}/series/observations"))
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("sort_order", "desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport(PROVIDER, &e))?;

        if !response.status().is_success() {
            return Err(status(PROVIDER, response.status()));
        }

        let data: ObservationsResponse = response
            .json()
            .await
            .map_err(|e| transport(PROVIDER, &e))?;
        Ok(data.observations)
    }

    /// Latest reported value, skipping missing observations
    pub async fn latest(&self, series_id: &str) -> Result<f64> {
        let observations = self.observations(series_id, 10).await?;
        latest_value(&observations).ok_or_else(|| {
            StockError::Api(format!("{PROVIDER}: no observations for {series_id}"))
        })
    }

    /// Year-over-year change in percent of a monthly series
    pub async fn year_over_year(&self, series_id: &str) -> Result<f64> {
        let observations = self.observations(series_id, 13).await?;
        yoy_percent(&observations).ok_or_else(|| {
            StockError::Api(format!(
                "{PROVIDER}: insufficient data for {series_id} YoY"
            ))
        })
    }

    async fn optional(&self, series_id: &str) -> Option<f64> {
        or_warn(series_id, self.latest(series_id).await)
    }
}

/// Drop a failed series from the snapshot, logging why
fn or_warn(series_id: &str, result: Result<f64>) -> Option<f64> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(series_id, error = %e, "FRED series unavailable");
            None
        }
    }
}

#[async_trait]
impl MacroSource for FredClient {
    #[instrument(skip(self))]
    async fn snapshot(&self) -> Result<MacroSnapshot> {
        let snapshot = MacroSnapshot {
            fed_funds_rate: self.optional(series::FED_FUNDS_RATE).await,
            treasury_10y: self.optional(series::TREASURY_10Y).await,
            treasury_2y: self.optional(series::TREASURY_2Y).await,
            unemployment_rate: self.optional(series::UNEMPLOYMENT_RATE).await,
            cpi: or_warn(series::CPI, self.year_over_year(series::CPI).await),
            vix: self.optional(series::VIX).await,
            ..Default::default()
        };

        if snapshot == MacroSnapshot::default() {
            return Err(StockError::Api(format!("{PROVIDER}: no series could be fetched")));
        }

        debug!(?snapshot, "Fetched macro snapshot");
        Ok(snapshot.with_derived_spread())
    }
}

fn latest_value(observations: &[Observation]) -> Option<f64> {
    observations.iter().find_map(Observation::parsed)
}

/// Newest value against the one twelve observations earlier
fn yoy_percent(observations: &[Observation]) -> Option<f64> {
    let current = observations.first()?.parsed()?;
    let year_ago = observations.get(12)?.parsed()?;
    if year_ago <= 0.0 {
        return None;
    }
    Some((current - year_ago) / year_ago * 100.0)
}
