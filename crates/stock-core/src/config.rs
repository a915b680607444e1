//! Configuration for the analysis pipeline

use crate::error::{Result, StockError};
use crate::market::LookbackPeriod;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of headlines classified per request
pub const DEFAULT_HEADLINE_LIMIT: usize = 5;

/// Configuration for a [`StockPipeline`](crate::pipeline::StockPipeline)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound for any single external call (fetch, classify, narrate)
    pub call_timeout: Duration,

    /// Maximum number of headlines scored per request
    pub headline_limit: usize,

    /// Lookback used when the caller does not pick one
    pub default_period: LookbackPeriod,

    /// Whether `analyze` asks the narrator for commentary
    pub narrative: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(15),
            headline_limit: DEFAULT_HEADLINE_LIMIT,
            default_period: LookbackPeriod::ThreeMonths,
            narrative: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.call_timeout.is_zero() {
            return Err(StockError::Config(
                "call_timeout must be greater than 0".to_string(),
            ));
        }

        if self.headline_limit == 0 {
            return Err(StockError::Config(
                "headline_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for PipelineConfig
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    call_timeout: Option<Duration>,
    headline_limit: Option<usize>,
    default_period: Option<LookbackPeriod>,
    narrative: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the per-call timeout
    pub fn call_timeout(mut self, duration: Duration) -> Self {
        self.call_timeout = Some(duration);
        self
    }

    /// Set the headline cap
    pub fn headline_limit(mut self, limit: usize) -> Self {
        self.headline_limit = Some(limit);
        self
    }

    /// Set the default lookback period
    pub fn default_period(mut self, period: LookbackPeriod) -> Self {
        self.default_period = Some(period);
        self
    }

    /// Enable or disable narrative generation
    pub fn narrative(mut self, enabled: bool) -> Self {
        self.narrative = Some(enabled);
        self
    }

    /// Read `STOCK_AGENT_TIMEOUT_SECS` and `STOCK_AGENT_HEADLINE_LIMIT`
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn with_env(mut self) -> Self {
        if let Ok(raw) = std::env::var("STOCK_AGENT_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) => self.call_timeout = Some(Duration::from_secs(secs)),
                Err(_) => tracing::warn!("Ignoring invalid STOCK_AGENT_TIMEOUT_SECS={raw}"),
            }
        }
        if let Ok(raw) = std::env::var("STOCK_AGENT_HEADLINE_LIMIT") {
            match raw.parse::<usize>() {
                Ok(limit) => self.headline_limit = Some(limit),
                Err(_) => tracing::warn!("Ignoring invalid STOCK_AGENT_HEADLINE_LIMIT={raw}"),
            }
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();

        let config = PipelineConfig {
            call_timeout: self.call_timeout.unwrap_or(defaults.call_timeout),
            headline_limit: self.headline_limit.unwrap_or(defaults.headline_limit),
            default_period: self.default_period.unwrap_or(defaults.default_period),
            narrative: self.narrative.unwrap_or(defaults.narrative),
        };

        config.validate()?;
        Ok(config)
    }
}
