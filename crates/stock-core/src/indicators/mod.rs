//! Technical indicator engine
//!
//! [`compute_indicators`] turns a chronological bar series into an
//! [`IndicatorSnapshot`] of latest values. Every indicator is computed on its
//! own: too little history or a degenerate divisor makes that one indicator
//! `None` and leaves the rest untouched.
//!
//! Minimum history per indicator:
//!
//! | indicator        | bars |
//! |------------------|------|
//! | MA5 / MA20 / MA60 | 5 / 20 / 60 |
//! | RSI(14)          | 14   |
//! | MACD(12, 26, 9)  | 26   |
//! | Bollinger(20, 2) | 20   |
//! | cross signal     | 21   |
//! | volatility, volume ratio | 1 |

pub mod math;

use crate::market::PriceBar;
use math::{finite, pct_change, safe_div, sample_std, sma};
use serde::{Deserialize, Serialize};
use std::fmt;
use ta::Next;
use ta::indicators::ExponentialMovingAverage;

pub const SHORT_MA_PERIOD: usize = 5;
pub const MID_MA_PERIOD: usize = 20;
pub const LONG_MA_PERIOD: usize = 60;

pub const RSI_PERIOD: usize = 14;
/// Stand-in for a zero average loss so RSI saturates near 100 instead of dividing by zero
pub const RSI_ZERO_LOSS_EPSILON: f64 = 1e-10;

pub const MACD_FAST_PERIOD: usize = 12;
pub const MACD_SLOW_PERIOD: usize = 26;
pub const MACD_SIGNAL_PERIOD: usize = 9;
/// MACD is reported once the slow EMA has seen a full period of closes
pub const MACD_MIN_BARS: usize = MACD_SLOW_PERIOD;

pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_K: f64 = 2.0;

pub const VOLATILITY_WINDOW: usize = 30;
pub const VOLUME_WINDOW: usize = 20;

/// Crossover of MA5 through MA20 on the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossSignal {
    /// MA5 moved above MA20
    Golden,
    /// MA5 moved below MA20
    Death,
}

impl fmt::Display for CrossSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossSignal::Golden => f.write_str("golden cross"),
            CrossSignal::Death => f.write_str("death cross"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Close within the band: 0 = lower band, 100 = upper band
    pub position: Option<f64>,
}

/// Latest indicator values for one bar series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub bars: usize,
    pub current_price: Option<f64>,
    pub period_return: Option<f64>,
    pub period_high: Option<f64>,
    pub period_low: Option<f64>,
    pub ma5: Option<f64>,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<Macd>,
    pub bollinger: Option<BollingerBands>,
    pub volatility: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub cross: Option<CrossSignal>,
}

impl IndicatorSnapshot {
    /// Indicator name to value, in display order
    pub fn entries(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("current_price", self.current_price),
            ("period_return", self.period_return),
            ("period_high", self.period_high),
            ("period_low", self.period_low),
            ("ma5", self.ma5),
            ("ma20", self.ma20),
            ("ma60", self.ma60),
            ("rsi", self.rsi),
            ("macd", self.macd.map(|m| m.macd)),
            ("macd_signal", self.macd.map(|m| m.signal)),
            ("macd_histogram", self.macd.map(|m| m.histogram)),
            ("bb_upper", self.bollinger.map(|b| b.upper)),
            ("bb_middle", self.bollinger.map(|b| b.middle)),
            ("bb_lower", self.bollinger.map(|b| b.lower)),
            ("bb_position", self.bollinger.and_then(|b| b.position)),
            ("volatility", self.volatility),
            ("volume_ratio", self.volume_ratio),
        ]
    }

    /// Look up a single value by its [`entries`](Self::entries) name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(key, _)| *key == name)
            .and_then(|(_, value)| value)
    }

    /// The moving averages that could be computed, shortest first
    pub fn moving_averages(&self) -> Vec<(usize, f64)> {
        [
            (SHORT_MA_PERIOD, self.ma5),
            (MID_MA_PERIOD, self.ma20),
            (LONG_MA_PERIOD, self.ma60),
        ]
        .into_iter()
        .filter_map(|(period, value)| value.map(|v| (period, v)))
        .collect()
    }
}

/// Compute every indicator over `bars`
///
/// Never fails; an empty series yields a snapshot with every value absent.
pub fn compute_indicators(bars: &[PriceBar]) -> IndicatorSnapshot {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let snapshot = IndicatorSnapshot {
        bars: bars.len(),
        current_price: closes.last().copied().and_then(finite),
        period_return: period_return(&closes),
        period_high: bars.iter().map(|b| b.high).reduce(f64::max).and_then(finite),
        period_low: bars.iter().map(|b| b.low).reduce(f64::min).and_then(finite),
        ma5: sma(&closes, SHORT_MA_PERIOD),
        ma20: sma(&closes, MID_MA_PERIOD),
        ma60: sma(&closes, LONG_MA_PERIOD),
        rsi: rsi(&closes),
        macd: macd(&closes),
        bollinger: bollinger(&closes),
        volatility: volatility(bars),
        volume_ratio: volume_ratio(bars),
        cross: cross_signal(&closes),
    };

    tracing::debug!(
        bars = snapshot.bars,
        rsi = ?snapshot.rsi,
        cross = ?snapshot.cross,
        "Computed indicator snapshot"
    );

    snapshot
}

fn period_return(closes: &[f64]) -> Option<f64> {
    pct_change(*closes.first()?, *closes.last()?)
}

/// RSI over the last [`RSI_PERIOD`] close changes
///
/// The first bar has no predecessor and counts as an unchanged period, so a
/// series of exactly 14 bars averages 13 real changes over 14 slots.
///
/// A flat window is the one zero-loss case that does not rise above 50.
pub fn rsi(closes: &[f64]) -> Option<f64> {
    if closes.len() < RSI_PERIOD {
        return None;
    }

    let changes: Vec<f64> = std::iter::once(0.0)
        .chain(closes.windows(2).map(|w| w[1] - w[0]))
        .collect();
    let window = &changes[changes.len() - RSI_PERIOD..];

    let avg_gain = window.iter().filter(|c| **c > 0.0).sum::<f64>() / RSI_PERIOD as f64;
    let avg_loss = window.iter().filter(|c| **c < 0.0).map(|c| -c).sum::<f64>() / RSI_PERIOD as f64;

    rsi_from_averages(avg_gain, avg_loss)
}

/// RSI from average gain and loss
///
/// A zero average loss is replaced by [`RSI_ZERO_LOSS_EPSILON`] rather than
/// making the value absent. A window with neither gains nor losses is 50.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_gain == 0.0 && avg_loss == 0.0 {
        return Some(50.0);
    }
    let loss = if avg_loss > 0.0 {
        avg_loss
    } else {
        RSI_ZERO_LOSS_EPSILON
    };
    finite(100.0 - 100.0 / (1.0 + avg_gain / loss))
}

/// MACD(12, 26, 9) from recursive EMAs seeded with the first close
pub fn macd(closes: &[f64]) -> Option<Macd> {
    if closes.len() < MACD_MIN_BARS {
        return None;
    }

    let mut fast = ExponentialMovingAverage::new(MACD_FAST_PERIOD).ok()?;
    let mut slow = ExponentialMovingAverage::new(MACD_SLOW_PERIOD).ok()?;
    let mut signal = ExponentialMovingAverage::new(MACD_SIGNAL_PERIOD).ok()?;

    let mut latest = None;
    for &close in closes {
        let line = fast.next(close) - slow.next(close);
        latest = Some((line, signal.next(line)));
    }

    let (line, signal) = latest?;
    Some(Macd {
        macd: finite(line)?,
        signal: finite(signal)?,
        histogram: finite(line - signal)?,
    })
}

/// Bollinger Bands(20, 2) with the close's position inside the band
pub fn bollinger(closes: &[f64]) -> Option<BollingerBands> {
    let middle = sma(closes, BOLLINGER_PERIOD)?;
    let std = sample_std(closes, BOLLINGER_PERIOD)?;
    let close = *closes.last()?;

    let upper = middle + BOLLINGER_K * std;
    let lower = middle - BOLLINGER_K * std;

    Some(BollingerBands {
        upper,
        middle,
        lower,
        position: safe_div(close - lower, upper - lower).map(|r| r * 100.0),
    })
}

/// High-low range of the last [`VOLATILITY_WINDOW`] bars relative to the low
pub fn volatility(bars: &[PriceBar]) -> Option<f64> {
    let window = &bars[bars.len().saturating_sub(VOLATILITY_WINDOW)..];
    let high = window.iter().map(|b| b.high).reduce(f64::max)?;
    let low = window.iter().map(|b| b.low).reduce(f64::min)?;

    if low <= 0.0 {
        return None;
    }
    safe_div(high - low, low).map(|r| r * 100.0)
}

/// Latest volume as a percentage of the trailing average volume
pub fn volume_ratio(bars: &[PriceBar]) -> Option<f64> {
    let latest = bars.last()?.volume as f64;
    let window = &bars[bars.len().saturating_sub(VOLUME_WINDOW)..];
    let average = safe_div(
        window.iter().map(|b| b.volume as f64).sum(),
        window.len() as f64,
    )?;
    safe_div(latest, average).map(|r| r * 100.0)
}

/// MA5/MA20 crossover between the previous and the latest bar
pub fn cross_signal(closes: &[f64]) -> Option<CrossSignal> {
    if closes.len() < MID_MA_PERIOD + 1 {
        return None;
    }
    let previous = &closes[..closes.len() - 1];

    let short_now = sma(closes, SHORT_MA_PERIOD)?;
    let long_now = sma(closes, MID_MA_PERIOD)?;
    let short_prev = sma(previous, SHORT_MA_PERIOD)?;
    let long_prev = sma(previous, MID_MA_PERIOD)?;

    if short_prev <= long_prev && short_now > long_now {
        Some(CrossSignal::Golden)
    } else if short_prev >= long_prev && short_now < long_now {
        Some(CrossSignal::Death)
    } else {
        None
    }
}
