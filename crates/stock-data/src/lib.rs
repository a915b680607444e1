//! Data adapters for the stock agent
//!
//! Each client implements one of the source traits from `stock-core`:
//!
//! - [`YahooFinanceClient`]: daily price bars ([`stock_core::PriceSource`])
//! - [`GoogleNewsClient`]: headlines from the Google News RSS search feed
//!   ([`stock_core::NewsSource`])
//! - [`AlphaVantageClient`]: fundamentals and holdings
//!   ([`stock_core::FundamentalsSource`])
//! - [`FredClient`]: macro indicators ([`stock_core::MacroSource`])
//!
//! Keyed APIs are throttled client-side with a `governor` rate limiter.

pub mod api;
mod error;

pub use api::{AlphaVantageClient, FredClient, GoogleNewsClient, YahooFinanceClient};
