//! Rule-based signal aggregation
//!
//! Each rule looks at one indicator and adds at most one factor to either the
//! positive or the negative list. The recommendation is a plain majority vote
//! over the two lists; no numeric score is produced.

use crate::indicators::{CrossSignal, IndicatorSnapshot};
use crate::sentiment::SentimentScore;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const BOLLINGER_LOWER_ZONE: f64 = 20.0;
pub const BOLLINGER_UPPER_ZONE: f64 = 80.0;
/// Volume ratio (percent of trailing average) separating rising from falling volume
pub const VOLUME_BASELINE: f64 = 100.0;
/// Sentiment magnitude needed for news to count as a factor
pub const SENTIMENT_THRESHOLD: f64 = 20.0;

/// Overall leaning of the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    BuyLeaning,
    SellLeaning,
    Neutral,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::BuyLeaning => "buy-leaning",
            Recommendation::SellLeaning => "sell-leaning",
            Recommendation::Neutral => "neutral",
        })
    }
}

/// Final output of the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalVerdict {
    pub recommendation: Recommendation,
    pub positive_factors: Vec<String>,
    pub negative_factors: Vec<String>,
}

enum Vote {
    Positive(String),
    Negative(String),
}

/// Combine indicators, news sentiment and the day's price change into a verdict
///
/// Total: absent inputs simply contribute no factor.
pub fn aggregate_signal(
    snapshot: &IndicatorSnapshot,
    sentiment: SentimentScore,
    price_change_pct: Option<f64>,
) -> SignalVerdict {
    let votes = [
        moving_average_rule(snapshot),
        rsi_rule(snapshot),
        macd_rule(snapshot),
        bollinger_rule(snapshot),
        cross_rule(snapshot),
        volume_rule(snapshot, price_change_pct),
        sentiment_rule(sentiment),
    ];

    let mut positive_factors = Vec::new();
    let mut negative_factors = Vec::new();
    for vote in votes.into_iter().flatten() {
        match vote {
            Vote::Positive(factor) => positive_factors.push(factor),
            Vote::Negative(factor) => negative_factors.push(factor),
        }
    }

    let recommendation = match positive_factors.len().cmp(&negative_factors.len()) {
        std::cmp::Ordering::Greater => Recommendation::BuyLeaning,
        std::cmp::Ordering::Less => Recommendation::SellLeaning,
        std::cmp::Ordering::Equal => Recommendation::Neutral,
    };

    SignalVerdict {
        recommendation,
        positive_factors,
        negative_factors,
    }
}

fn moving_average_rule(snapshot: &IndicatorSnapshot) -> Option<Vote> {
    let price = snapshot.current_price?;
    let averages = snapshot.moving_averages();
    if averages.is_empty() {
        return None;
    }

    let labels = averages
        .iter()
        .map(|(period, _)| format!("MA{period}"))
        .collect::<Vec<_>>()
        .join("/");

    if averages.iter().all(|(_, ma)| price > *ma) {
        Some(Vote::Positive(format!(
            "Price {price:.2} is above {labels} (uptrend)"
        )))
    } else if averages.iter().all(|(_, ma)| price < *ma) {
        Some(Vote::Negative(format!(
            "Price {price:.2} is below {labels} (downtrend)"
        )))
    } else {
        None
    }
}

fn rsi_rule(snapshot: &IndicatorSnapshot) -> Option<Vote> {
    let rsi = snapshot.rsi?;
    if rsi > RSI_OVERBOUGHT {
        Some(Vote::Negative(format!(
            "RSI {rsi:.1} is overbought (above {RSI_OVERBOUGHT:.0}), correction risk"
        )))
    } else if rsi < RSI_OVERSOLD {
        Some(Vote::Negative(format!(
            "RSI {rsi:.1} is oversold (below {RSI_OVERSOLD:.0}), selling pressure"
        )))
    } else {
        None
    }
}

fn macd_rule(snapshot: &IndicatorSnapshot) -> Option<Vote> {
    let macd = snapshot.macd?;
    if macd.macd > macd.signal {
        Some(Vote::Positive(format!(
            "MACD {:.2} above signal {:.2} (upward momentum)",
            macd.macd, macd.signal
        )))
    } else if macd.macd < macd.signal {
        Some(Vote::Negative(format!(
            "MACD {:.2} below signal {:.2} (downward momentum)",
            macd.macd, macd.signal
        )))
    } else {
        None
    }
}

fn bollinger_rule(snapshot: &IndicatorSnapshot) -> Option<Vote> {
    let position = snapshot.bollinger?.position?;
    if position <= BOLLINGER_LOWER_ZONE {
        Some(Vote::Positive(format!(
            "Price near the lower Bollinger band ({position:.1}%)"
        )))
    } else if position >= BOLLINGER_UPPER_ZONE {
        Some(Vote::Negative(format!(
            "Price near the upper Bollinger band ({position:.1}%)"
        )))
    } else {
        None
    }
}

fn cross_rule(snapshot: &IndicatorSnapshot) -> Option<Vote> {
    match snapshot.cross? {
        CrossSignal::Golden => Some(Vote::Positive(
            "Golden cross: MA5 crossed above MA20".to_string(),
        )),
        CrossSignal::Death => Some(Vote::Negative(
            "Death cross: MA5 crossed below MA20".to_string(),
        )),
    }
}

fn volume_rule(snapshot: &IndicatorSnapshot, price_change_pct: Option<f64>) -> Option<Vote> {
    let ratio = snapshot.volume_ratio?;
    let change = price_change_pct.filter(|c| c.is_finite())?;

    if ratio > VOLUME_BASELINE && change > 0.0 {
        Some(Vote::Positive(format!(
            "Volume up ({ratio:.0}% of average) with price up {change:.2}%"
        )))
    } else if ratio < VOLUME_BASELINE && change < 0.0 {
        Some(Vote::Negative(format!(
            "Volume down ({ratio:.0}% of average) with price down {change:.2}%"
        )))
    } else {
        None
    }
}

fn sentiment_rule(sentiment: SentimentScore) -> Option<Vote> {
    let score = sentiment.value();
    if score >= SENTIMENT_THRESHOLD {
        Some(Vote::Positive(format!("Positive news sentiment ({sentiment})")))
    } else if score <= -SENTIMENT_THRESHOLD {
        Some(Vote::Negative(format!("Negative news sentiment ({sentiment})")))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{BollingerBands, Macd, compute_indicators};
    use crate::market::fixtures::bars_from_closes;

    fn neutral() -> SentimentScore {
        SentimentScore::NEUTRAL
    }

    #[test]
    fn test_empty_snapshot_is_neutral() {
        let verdict = aggregate_signal(&IndicatorSnapshot::default(), neutral(), None);
        assert_eq!(verdict.recommendation, Recommendation::Neutral);
        assert!(verdict.positive_factors.is_empty());
        assert!(verdict.negative_factors.is_empty());
    }

    #[test]
    fn test_rising_closes_keep_moving_average_factor_positive() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + 2.0 * i as f64).collect();
        let snapshot = compute_indicators(&bars_from_closes(&closes));
        let verdict = aggregate_signal(&snapshot, neutral(), Some(1.0));

        assert!(verdict.negative_factors.iter().all(|f| !f.contains("MA")));
        assert!(verdict.positive_factors.iter().any(|f| f.contains("above MA5/MA20")));
    }

    #[test]
    fn test_rsi_thresholds() {
        let mut snapshot = IndicatorSnapshot {
            rsi: Some(75.0),
            ..Default::default()
        };
        let verdict = aggregate_signal(&snapshot, neutral(), None);
        assert_eq!(verdict.negative_factors.len(), 1);
        assert!(verdict.negative_factors[0].contains("overbought"));

        snapshot.rsi = Some(25.0);
        let verdict = aggregate_signal(&snapshot, neutral(), None);
        assert!(verdict.negative_factors[0].contains("oversold"));

        snapshot.rsi = Some(50.0);
        let verdict = aggregate_signal(&snapshot, neutral(), None);
        assert!(verdict.negative_factors.is_empty());
        assert!(verdict.positive_factors.is_empty());
    }

    #[test]
    fn test_majority_vote() {
        let snapshot = IndicatorSnapshot {
            current_price: Some(110.0),
            ma5: Some(100.0),
            macd: Some(Macd {
                macd: 1.0,
                signal: 0.5,
                histogram: 0.5,
            }),
            rsi: Some(80.0),
            ..Default::default()
        };
        let verdict = aggregate_signal(&snapshot, neutral(), None);
        assert_eq!(verdict.positive_factors.len(), 2);
        assert_eq!(verdict.negative_factors.len(), 1);
        assert_eq!(verdict.recommendation, Recommendation::BuyLeaning);

        let verdict = aggregate_signal(&snapshot, SentimentScore::new(-60.0), None);
        assert_eq!(verdict.recommendation, Recommendation::Neutral);
    }

    #[test]
    fn test_sell_leaning() {
        let snapshot = IndicatorSnapshot {
            current_price: Some(90.0),
            ma5: Some(100.0),
            ma20: Some(105.0),
            bollinger: Some(BollingerBands {
                upper: 120.0,
                middle: 100.0,
                lower: 80.0,
                position: Some(85.0),
            }),
            cross: Some(CrossSignal::Death),
            volume_ratio: Some(60.0),
            ..Default::default()
        };
        let verdict = aggregate_signal(&snapshot, SentimentScore::new(-40.0), Some(-2.5));
        assert_eq!(verdict.recommendation, Recommendation::SellLeaning);
        assert_eq!(verdict.negative_factors.len(), 5);
        assert!(verdict.positive_factors.is_empty());
    }

    #[test]
    fn test_mixed_moving_averages_contribute_nothing() {
        let snapshot = IndicatorSnapshot {
            current_price: Some(100.0),
            ma5: Some(95.0),
            ma20: Some(105.0),
            ..Default::default()
        };
        let verdict = aggregate_signal(&snapshot, neutral(), None);
        assert!(verdict.positive_factors.is_empty());
        assert!(verdict.negative_factors.is_empty());
    }

    #[test]
    fn test_volume_rule_needs_price_change() {
        let snapshot = IndicatorSnapshot {
            volume_ratio: Some(180.0),
            ..Default::default()
        };
        assert!(aggregate_signal(&snapshot, neutral(), None).positive_factors.is_empty());
        assert_eq!(
            aggregate_signal(&snapshot, neutral(), Some(3.0)).recommendation,
            Recommendation::BuyLeaning
        );
        assert_eq!(
            aggregate_signal(&snapshot, neutral(), Some(-3.0)).recommendation,
            Recommendation::Neutral
        );
    }

    #[test]
    fn test_recommendation_serializes_kebab_case() {
        let json = serde_json::to_string(&Recommendation::BuyLeaning).unwrap();
        assert_eq!(json, "\"buy-leaning\"");
    }
}
