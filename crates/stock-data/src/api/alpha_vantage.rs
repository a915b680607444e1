//! Alpha Vantage fundamentals source
//!
//! Fundamentals and holdings both come from one `OVERVIEW` request. Numbers
//! arrive as strings; Alpha Vantage writes `"None"` or `"-"` for missing
//! values, which map to `None` here.

use crate::error::{SharedRateLimiter, http_client, rate_limiter, status, transport};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use stock_core::context::{FinancialHealth, Growth, OtherMetrics, Profitability, Valuation};
use stock_core::{
    CompanyProfile, Fundamentals, FundamentalsSource, Holdings, Result, StockError, Symbol,
};
use tracing::{debug, instrument};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "Alpha Vantage";

/// Free tier allowance
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 5;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl AlphaVantageClient {
    /// Create a client with an API key and a per-minute request budget
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

    /// Create from `ALPHA_VANTAGE_API_KEY` with the free-tier budget
    pub fn from_env(timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY").map_err(|_| {
            StockError::Config("ALPHA_VANTAGE_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key, DEFAULT_REQUESTS_PER_MINUTE, timeout)
    }

    /// Raw `OVERVIEW` document for a symbol
    pub async fn company_overview(&self, symbol: &Symbol) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "OVERVIEW"),
                ("symbol", symbol.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport(PROVIDER, &e))?;

        if !response.status().is_success() {
            return Err(status(PROVIDER, response.status()));
        }

        let data: Value = response.json().await.map_err(|e| transport(PROVIDER, &e))?;
        check_payload(symbol, &data)?;
        Ok(data)
    }
}

#[async_trait]
impl FundamentalsSource for AlphaVantageClient {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn company_profile(&self, symbol: &Symbol) -> Result<CompanyProfile> {
        let overview = self.company_overview(symbol).await?;
        debug!("Fetched company overview");
        Ok(parse_profile(&overview))
    }
}

pub(crate) fn parse_profile(data: &Value) -> CompanyProfile {
    CompanyProfile {
        fundamentals: parse_fundamentals(data),
        holdings: Some(parse_holdings(data)),
    }
}

/// Reject error, throttling and empty responses
fn check_payload(symbol: &Symbol, data: &Value) -> Result<()> {
    if let Some(error) = data.get("Error Message") {
        return Err(StockError::Api(format!("{PROVIDER}: {error}")));
    }

    if data.get("Note").is_some() || data.get("Information").is_some() {
        return Err(StockError::RateLimitExceeded {
            provider: PROVIDER.to_string(),
        });
    }

    if data.as_object().is_none_or(|o| o.is_empty()) {
        return Err(StockError::unavailable(symbol.as_str(), "no overview from Alpha Vantage"));
    }

    Ok(())
}

fn number(data: &Value, key: &str) -> Option<f64> {
    let raw = data.get(key)?.as_str()?.trim();
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn text(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "None" && *s != "-")
        .map(str::to_string)
}

/// Fractions such as `0.254` reported as percent
fn percent(data: &Value, key: &str) -> Option<f64> {
    number(data, key).map(|v| v * 100.0)
}

pub(crate) fn parse_fundamentals(data: &Value) -> Fundamentals {
    let gross_margin = match (number(data, "GrossProfitTTM"), number(data, "RevenueTTM")) {
        (Some(gross), Some(revenue)) if revenue > 0.0 => Some(gross / revenue * 100.0),
        _ => None,
    };

    Fundamentals {
        name: text(data, "Name"),
        sector: text(data, "Sector"),
        valuation: Valuation {
            pe_ratio: number(data, "PERatio"),
            forward_pe: number(data, "ForwardPE"),
            price_to_book: number(data, "PriceToBookRatio"),
            peg_ratio: number(data, "PEGRatio"),
            price_to_sales: number(data, "PriceToSalesRatioTTM"),
        },
        profitability: Profitability {
            return_on_equity: percent(data, "ReturnOnEquityTTM"),
            return_on_assets: percent(data, "ReturnOnAssetsTTM"),
            operating_margin: percent(data, "OperatingMarginTTM"),
            profit_margin: percent(data, "ProfitMargin"),
            gross_margin,
        },
        // OVERVIEW carries no balance-sheet ratios
        financial_health: FinancialHealth::default(),
        growth: Growth {
            revenue_growth: percent(data, "QuarterlyRevenueGrowthYOY"),
            earnings_growth: percent(data, "QuarterlyEarningsGrowthYOY"),
        },
        other: OtherMetrics {
            market_cap: number(data, "MarketCapitalization"),
            dividend_yield: percent(data, "DividendYield"),
            beta: number(data, "Beta"),
            week52_high: number(data, "52WeekHigh"),
            week52_low: number(data, "52WeekLow"),
            eps: number(data, "EPS"),
            book_value: number(data, "BookValue"),
        },
    }
}

pub(crate) fn parse_holdings(data: &Value) -> Holdings {
    Holdings {
        institutional_percent: number(data, "PercentInstitutions"),
        insider_percent: number(data, "PercentInsiders"),
        top_holders: Vec::new(),
        float_shares: number(data, "SharesFloat").map(|v| v as u64),
        shares_outstanding: number(data, "SharesOutstanding").map(|v| v as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overview() -> Value {
        json!({
            "Symbol": "AAPL",
            "Name": "Apple Inc",
            "Sector": "TECHNOLOGY",
            "MarketCapitalization": "3400000000000",
            "PERatio": "33.1",
            "ForwardPE": "None",
            "PEGRatio": "2.4",
            "PriceToBookRatio": "48.2",
            "PriceToSalesRatioTTM": "8.7",
            "ReturnOnEquityTTM": "1.6",
            "ProfitMargin": "0.24",
            "OperatingMarginTTM": "0.31",
            "GrossProfitTTM": "180000000000",
            "RevenueTTM": "400000000000",
            "QuarterlyRevenueGrowthYOY": "0.061",
            "DividendYield": "-",
            "Beta": "1.24",
            "52WeekHigh": "260.1",
            "52WeekLow": "164.08",
            "EPS": "6.08",
            "SharesOutstanding": "15000000000",
            "SharesFloat": "14900000000",
            "PercentInstitutions": "62.1",
            "PercentInsiders": "2.1"
        })
    }

    #[test]
    fn test_parse_fundamentals() {
        let fundamentals = parse_fundamentals(&overview());
        assert_eq!(fundamentals.name.as_deref(), Some("Apple Inc"));
        assert_eq!(fundamentals.valuation.pe_ratio, Some(33.1));
        assert_eq!(fundamentals.valuation.forward_pe, None);
        assert_eq!(fundamentals.other.dividend_yield, None);
        assert!((fundamentals.profitability.profit_margin.unwrap() - 24.0).abs() < 1e-9);
        assert!((fundamentals.profitability.gross_margin.unwrap() - 45.0).abs() < 1e-9);
        assert_eq!(fundamentals.financial_health, FinancialHealth::default());
    }

    #[test]
    fn test_parse_holdings() {
        let holdings = parse_holdings(&overview());
        assert_eq!(holdings.institutional_percent, Some(62.1));
        assert_eq!(holdings.shares_outstanding, Some(15_000_000_000));
        assert!(holdings.top_holders.is_empty());
    }

    #[test]
    fn test_one_overview_fills_the_whole_profile() {
        let profile = parse_profile(&overview());
        assert_eq!(profile.fundamentals.valuation.peg_ratio, Some(2.4));
        assert_eq!(
            profile.holdings.and_then(|h| h.insider_percent),
            Some(2.1)
        );
    }

    #[test]
    fn test_check_payload() {
        let symbol = Symbol::new("005930.KS");
        assert!(check_payload(&symbol, &overview()).is_ok());
        assert!(check_payload(&symbol, &json!({})).unwrap_err().is_data_unavailable());
        assert!(matches!(
            check_payload(&symbol, &json!({"Note": "Thank you for using Alpha Vantage!"})),
            Err(StockError::RateLimitExceeded { .. })
        ));
        assert!(matches!(
            check_payload(&symbol, &json!({"Error Message": "Invalid API call"})),
            Err(StockError::Api(_))
        ));
    }

    #[tokio::test]
    #[ignore] // Requires API key and network access
    async fn test_live_overview() {
        let client = AlphaVantageClient::from_env(Duration::from_secs(15)).unwrap();
        let profile = client.company_profile(&Symbol::new("AAPL")).await.unwrap();
        assert!(profile.fundamentals.name.unwrap().contains("Apple"));
    }
}
