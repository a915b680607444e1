//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use stock_core::LookbackPeriod;
use stock_llm::{ForecastHorizon, Language};
use stock_utils::LogFormat;

/// Stock indicator and signal agent
///
/// Companies can be given as a name ("삼성전자", "Apple"), a 6-digit Korean
/// code ("005930") or a ticker ("AAPL").
#[derive(Debug, Parser)]
#[command(name = "stock-agent", author, version, about, long_about = None)]
pub struct Cli {
    /// Log output format
    #[arg(long, global = true, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Log filter directives; falls back to RUST_LOG
    #[arg(long, global = true)]
    pub log_filter: Option<String>,

    /// Upper bound for each external call, in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Language of prompts and generated text (en, ko)
    #[arg(long, global = true, default_value_t = Language::English)]
    pub language: Language,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Latest price and change against the previous close
    Price(CompanyArgs),

    /// Technical indicator snapshot
    Indicators(PeriodArgs),

    /// Recent headlines with their sentiment labels
    News(CompanyArgs),

    /// Full analysis: indicators, context, news sentiment and verdict
    Analyze(AnalyzeArgs),

    /// Model price forecast over a horizon
    Forecast(ForecastArgs),

    /// Interactive session (default)
    Repl(ReplArgs),
}

#[derive(Debug, Args)]
pub struct CompanyArgs {
    /// Company name, Korean code or ticker
    pub company: String,
}

#[derive(Debug, Args)]
pub struct PeriodArgs {
    pub company: String,

    /// Lookback period (5d, 1mo, 3mo, 6mo, 1y, 5y)
    #[arg(long, short)]
    pub period: Option<LookbackPeriod>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    pub company: String,

    #[arg(long, short)]
    pub period: Option<LookbackPeriod>,

    /// Ask the model for written commentary
    #[arg(long)]
    pub narrative: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    pub company: String,

    /// Forecast horizon (7d, 1mo, 3mo, 6mo)
    #[arg(long, default_value_t = ForecastHorizon::SevenDays)]
    pub horizon: ForecastHorizon,

    /// Lookback used for the indicators fed to the model
    #[arg(long, short)]
    pub period: Option<LookbackPeriod>,
}

#[derive(Debug, Args)]
pub struct ReplArgs {
    #[arg(long, short)]
    pub period: Option<LookbackPeriod>,

    /// Ask the model for written commentary on each analysis
    #[arg(long)]
    pub narrative: bool,
}
