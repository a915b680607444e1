//! Logging and tracing utilities

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither an explicit filter nor `RUST_LOG` is given
pub const DEFAULT_FILTER: &str = "warn,stock_core=info,stock_data=info,stock_llm=info,stock_agent=info";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Unknown log format: {0}. Supported: pretty, json")]
    UnknownFormat(String),
}

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

/// Pick the filter: explicit directive, then `RUST_LOG`, then [`DEFAULT_FILTER`]
fn build_filter(filter: Option<&str>) -> anyhow::Result<EnvFilter> {
    match filter {
        Some(directives) => Ok(EnvFilter::try_new(directives)?),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Initialize the global tracing subscriber
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing(filter: Option<&str>, format: LogFormat) -> anyhow::Result<()> {
    let filter = build_filter(filter)?;
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
    }

    tracing::debug!(%format, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::default().to_string(), "pretty");
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        assert!(build_filter(Some("stock_core=verbose")).is_err());
        assert!(build_filter(Some("debug")).is_ok());
    }

    #[test]
    fn test_second_init_fails_without_panicking() {
        let _ = init_tracing(Some("warn"), LogFormat::Pretty);
        assert!(init_tracing(Some("warn"), LogFormat::Json).is_err());
    }
}
