//! API clients for stock data providers

pub mod alpha_vantage;
pub mod fred;
pub mod google_news;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use fred::{FredClient, series as fred_series};
pub use google_news::GoogleNewsClient;
pub use yahoo::YahooFinanceClient;
