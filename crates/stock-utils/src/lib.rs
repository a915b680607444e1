//! Shared utilities for the stock agent
//!
//! Currently this is the tracing setup used by the binary.

pub mod logging;

pub use logging::{DEFAULT_FILTER, LogFormat, LoggingError, init_tracing};
