//! Numeric helpers shared by the indicator engine
//!
//! Every helper returns `None` instead of a non-finite value.

use ta::Next;
use ta::indicators::SimpleMovingAverage;

/// Divide, or `None` when the divisor is zero or the result is not finite
pub fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }
    finite(numerator / denominator)
}

/// Keep a value only if it is a real number
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Simple moving average of the last `period` values
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let mut average = SimpleMovingAverage::new(period).ok()?;
    let latest = values[values.len() - period..]
        .iter()
        .fold(0.0, |_, &value| average.next(value));
    finite(latest)
}

/// Sample standard deviation (n - 1 denominator) of the last `period` values
pub fn sample_std(values: &[f64], period: usize) -> Option<f64> {
    if period < 2 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    let mean = sma(window, period)?;
    let sum_sq: f64 = window.iter().map(|v| (v - mean).powi(2)).sum();
    finite((sum_sq / (period - 1) as f64).sqrt())
}

/// Percentage change from `from` to `to`, absent unless `from` is positive
pub fn pct_change(from: f64, to: f64) -> Option<f64> {
    if from <= 0.0 {
        return None;
    }
    safe_div(to - from, from).map(|r| r * 100.0)
}
