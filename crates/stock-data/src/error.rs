//! Mapping of transport failures into [`StockError`]

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use stock_core::StockError;

pub(crate) type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Per-minute limiter; a zero budget falls back to one request per minute
pub(crate) fn rate_limiter(per_minute: u32) -> SharedRateLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, StockError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| StockError::Config(format!("Failed to build HTTP client: {e}")))
}

pub(crate) fn transport(provider: &str, err: &reqwest::Error) -> StockError {
    if err.is_timeout() {
        StockError::Api(format!("{provider} request timed out"))
    } else {
        StockError::Api(format!("{provider} request failed: {err}"))
    }
}

pub(crate) fn status(provider: &str, status: StatusCode) -> StockError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        StockError::RateLimitExceeded {
            provider: provider.to_string(),
        }
    } else {
        StockError::Api(format!("{provider} returned HTTP {status}"))
    }
}
