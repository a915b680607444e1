//! `stock-agent`: technical indicators, news sentiment and a rule-based
//! signal for Korean and US listings
//!
//! # Usage
//!
//! ```bash
//! # Optional: model-backed sentiment, narrative and forecasts
//! export ANTHROPIC_API_KEY="..."
//! # Optional: fundamentals and macro context
//! export ALPHA_VANTAGE_API_KEY="..."
//! export FRED_API_KEY="..."
//!
//! stock-agent analyze 삼성전자 --period 6mo
//! stock-agent --language ko forecast AAPL --horizon 1mo
//! stock-agent            # interactive session
//! ```

mod app;
mod cli;
mod commands;
mod render;
mod repl;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    stock_utils::init_tracing(cli.log_filter.as_deref(), cli.log_format)?;

    commands::run(&cli).await
}
