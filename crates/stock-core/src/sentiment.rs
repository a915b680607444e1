//! News sentiment scoring
//!
//! Headlines come from a [`NewsSource`], each one is labelled by a
//! [`HeadlineClassifier`], and the labels fold into a [`SentimentScore`].

use crate::error::{Result, StockError};
use crate::pipeline::with_timeout;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A news headline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub published: Option<String>,
    pub link: Option<String>,
}

impl Headline {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            published: None,
            link: None,
        }
    }
}

impl AsRef<str> for Headline {
    fn as_ref(&self) -> &str {
        &self.title
    }
}

/// Source of recent headlines for a company, most recent first
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_headlines(&self, company: &str, limit: usize) -> Result<Vec<Headline>>;
}

/// Per-headline classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        })
    }
}

impl FromStr for SentimentLabel {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "긍정" => Ok(Self::Positive),
            "negative" | "부정" => Ok(Self::Negative),
            "neutral" | "중립" => Ok(Self::Neutral),
            other => Err(StockError::Llm(format!("Unknown sentiment label: {other}"))),
        }
    }
}

/// Labels a single headline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeadlineClassifier: Send + Sync {
    async fn classify(&self, headline: &str) -> Result<SentimentLabel>;
}

/// Aggregate news sentiment in `[-100, 100]`
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentimentScore(f64);

impl SentimentScore {
    pub const NEUTRAL: SentimentScore = SentimentScore(0.0);

    /// Clamp into range; non-finite input is treated as neutral
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(-100.0, 100.0))
        } else {
            Self::NEUTRAL
        }
    }

    /// `(positive - negative) / total * 100`, or 0 with no labels
    pub fn from_labels(labels: &[SentimentLabel]) -> Self {
        if labels.is_empty() {
            return Self::NEUTRAL;
        }
        let positive = labels.iter().filter(|l| **l == SentimentLabel::Positive).count() as f64;
        let negative = labels.iter().filter(|l| **l == SentimentLabel::Negative).count() as f64;
        Self::new((positive - negative) / labels.len() as f64 * 100.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for SentimentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.1}", self.0)
    }
}

/// A headline together with the label it received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHeadline {
    pub headline: String,
    pub label: SentimentLabel,
}

/// Score plus the per-headline breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub score: SentimentScore,
    pub headlines: Vec<ScoredHeadline>,
    /// Headlines that could not be classified and were left out of the score
    pub skipped: usize,
}

impl SentimentReport {
    pub fn count(&self, label: SentimentLabel) -> usize {
        self.headlines.iter().filter(|h| h.label == label).count()
    }
}

/// Classifies a capped list of headlines and aggregates the result
#[derive(Clone)]
pub struct SentimentScorer {
    classifier: Arc<dyn HeadlineClassifier>,
    limit: usize,
    call_timeout: Duration,
}

impl SentimentScorer {
    pub fn new(
        classifier: Arc<dyn HeadlineClassifier>,
        limit: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            limit,
            call_timeout,
        }
    }

    /// Score the first `limit` headlines
    ///
    /// Never fails: an empty list scores 0, and a headline whose
    /// classification errors or times out is skipped.
    pub async fn score<S: AsRef<str> + Sync>(&self, headlines: &[S]) -> SentimentReport {
        let mut report = SentimentReport::default();

        for headline in headlines.iter().take(self.limit) {
            let text = headline.as_ref();
            let outcome = with_timeout(
                "headline classification",
                self.call_timeout,
                self.classifier.classify(text),
            )
            .await;

            match outcome {
                Ok(label) => {
                    debug!(%label, headline = text, "Classified headline");
                    report.headlines.push(ScoredHeadline {
                        headline: text.to_string(),
                        label,
                    });
                }
                Err(e) => {
                    warn!(headline = text, error = %e, "Skipping unclassified headline");
                    report.skipped += 1;
                }
            }
        }

        let labels: Vec<SentimentLabel> = report.headlines.iter().map(|h| h.label).collect();
        report.score = SentimentScore::from_labels(&labels);
        report
    }
}

const POSITIVE_KEYWORDS: &[&str] = &[
    "실적 개선", "신제품", "투자 확대", "수주", "협력",
    "beat", "beats", "record", "surge", "soar", "upgrade", "launch", "partnership",
    "growth", "rally", "profit rises", "wins contract", "expands",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "실적 악화", "리콜", "소송", "감원", "적자",
    "miss", "misses", "recall", "lawsuit", "layoff", "layoffs", "plunge", "downgrade",
    "loss", "probe", "slump", "cuts", "fine",
];

/// Deterministic keyword classifier
///
/// Counts whole-word keyword hits (substring hits for Korean keywords);
/// the side with more hits wins, ties are neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn label(&self, headline: &str) -> SentimentLabel {
        let lowered = headline.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();

        let hits = |keywords: &[&str]| {
            keywords
                .iter()
                .filter(|k| {
                    if k.is_ascii() && !k.contains(' ') {
                        words.contains(k)
                    } else {
                        lowered.contains(*k)
                    }
                })
                .count()
        };

        let positive = hits(POSITIVE_KEYWORDS);
        let negative = hits(NEGATIVE_KEYWORDS);

        match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => SentimentLabel::Positive,
            std::cmp::Ordering::Less => SentimentLabel::Negative,
            std::cmp::Ordering::Equal => SentimentLabel::Neutral,
        }
    }
}

#[async_trait]
impl HeadlineClassifier for KeywordClassifier {
    async fn classify(&self, headline: &str) -> Result<SentimentLabel> {
        Ok(self.label(headline))
    }
}
