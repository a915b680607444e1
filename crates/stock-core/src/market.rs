//! Market data types and the price source seam

use crate::error::{Result, StockError};
use crate::indicators::math::safe_div;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange a symbol trades on, as far as display is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Market {
    /// KOSPI / KOSDAQ listings (`.KS`, `.KQ`)
    Korea,
    /// Everything else, priced in dollars
    Us,
}

impl Market {
    /// Currency label used when printing prices
    pub fn format_price(self, price: f64) -> String {
        match self {
            Market::Korea => format!("{}원", group_thousands(price.round())),
            Market::Us => format!("${price:.2}"),
        }
    }
}

fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Canonical market symbol, e.g. `AAPL` or `005930.KS`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn market(&self) -> Market {
        if self.0.ends_with(".KS") || self.0.ends_with(".KQ") {
            Market::Korea
        } else {
            Market::Us
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One daily OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// How far back a price series reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LookbackPeriod {
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[default]
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "5y")]
    FiveYears,
}

impl LookbackPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::FiveYears => "5y",
        }
    }

    /// Calendar days covered by the period
    pub fn days(self) -> i64 {
        match self {
            Self::FiveDays => 5,
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
            Self::OneYear => 365,
            Self::FiveYears => 1825,
        }
    }
}

impl fmt::Display for LookbackPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookbackPeriod {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "5d" => Ok(Self::FiveDays),
            "1mo" => Ok(Self::OneMonth),
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "5y" => Ok(Self::FiveYears),
            other => Err(StockError::Config(format!(
                "Invalid period: {other}. Supported: 5d, 1mo, 3mo, 6mo, 1y, 5y"
            ))),
        }
    }
}

/// Latest price against the previous close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: Symbol,
    pub current_price: f64,
    pub previous_price: f64,
    /// Day-over-day change in percent, absent when the previous close is not positive
    pub change_percent: Option<f64>,
}

impl PriceQuote {
    /// Build a quote from the last two bars; a single bar compares against itself
    pub fn from_bars(symbol: Symbol, bars: &[PriceBar]) -> Option<Self> {
        let last = bars.last()?;
        let previous = if bars.len() > 1 {
            bars[bars.len() - 2].close
        } else {
            last.close
        };

        let change_percent = if previous > 0.0 {
            safe_div(last.close - previous, previous).map(|r| r * 100.0)
        } else {
            None
        };

        Some(Self {
            symbol,
            current_price: last.close,
            previous_price: previous,
            change_percent,
        })
    }
}

/// Source of historical price bars
///
/// Implementations return bars in chronological order, or an error when the
/// symbol cannot be served.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_bars(&self, symbol: &Symbol, period: LookbackPeriod) -> Result<Vec<PriceBar>>;
}


#[cfg(test)]
mod tests {
    use super::fixtures::bars_from_closes;
    use super::*;

    #[test]
    fn test_symbol_market() {
        assert_eq!(Symbol::new("005930.KS").market(), Market::Korea);
        assert_eq!(Symbol::new("AAPL").market(), Market::Us);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(Market::Korea.format_price(71_500.0), "71,500원");
        assert_eq!(Market::Korea.format_price(950.0), "950원");
        assert_eq!(Market::Us.format_price(189.456), "$189.46");
    }

    #[test]
    fn test_period_round_trip_and_errors() {
        assert_eq!("6mo".parse::<LookbackPeriod>().unwrap(), LookbackPeriod::SixMonths);
        assert_eq!(LookbackPeriod::OneYear.to_string(), "1y");
        assert_eq!(LookbackPeriod::default(), LookbackPeriod::ThreeMonths);
        assert!("2w".parse::<LookbackPeriod>().is_err());
    }

    #[test]
    fn test_quote_from_bars() {
        let bars = bars_from_closes(&[100.0, 110.0]);
        let quote = PriceQuote::from_bars(Symbol::new("AAPL"), &bars).unwrap();
        assert_eq!(quote.current_price, 110.0);
        assert_eq!(quote.previous_price, 100.0);
        assert!((quote.change_percent.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_quote_edge_cases() {
        assert!(PriceQuote::from_bars(Symbol::new("AAPL"), &[]).is_none());

        let single = bars_from_closes(&[50.0]);
        let quote = PriceQuote::from_bars(Symbol::new("AAPL"), &single).unwrap();
        assert_eq!(quote.change_percent, Some(0.0));

        let zero_prev = bars_from_closes(&[0.0, 5.0]);
        let quote = PriceQuote::from_bars(Symbol::new("AAPL"), &zero_prev).unwrap();
        assert_eq!(quote.change_percent, None);
    }
}
