//! Price forecasts requested from a language model
//!
//! The model answers in a fixed line format (`Predicted price:`, `Direction:`,
//! `Confidence:` or their Korean equivalents). Whatever can be parsed is
//! lifted into [`Forecast`]; the raw answer is always kept.

use crate::config::ModelConfig;
use crate::prompts::{FORECAST_SYSTEM, FORECAST_USER, Language, indicator_rows, price_vars};
use crate::{CompletionRequest, LLMError, LLMProvider};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use stock_core::{Headline, IndicatorSnapshot, PriceQuote, Result};
use tracing::{info, instrument, warn};

/// Headlines handed to the model
const FORECAST_HEADLINES: usize = 3;
/// Half-width of the band around the predicted price, as a fraction
const BAND_WIDTH: f64 = 0.10;

static PREDICTED_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Predicted price|예상주가)\s*:\s*\**\s*([0-9][0-9,]*(?:\.[0-9]+)?)")
        .expect("predicted price pattern")
});
static DIRECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Direction|방향)\s*:\s*\**\s*(\S+)").expect("direction pattern")
});
static CONFIDENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Confidence|신뢰도)\s*:\s*\**\s*(\S+)").expect("confidence pattern")
});

/// How far ahead to forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ForecastHorizon {
    #[default]
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
}

impl ForecastHorizon {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SevenDays => "7d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
        }
    }

    pub fn days(self) -> u32 {
        match self {
            Self::SevenDays => 7,
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
        }
    }

    /// Human wording used inside prompts
    pub fn label(self, language: Language) -> &'static str {
        match (language, self) {
            (Language::English, Self::SevenDays) => "7 days",
            (Language::English, Self::OneMonth) => "1 month",
            (Language::English, Self::ThreeMonths) => "3 months",
            (Language::English, Self::SixMonths) => "6 months",
            (Language::Korean, Self::SevenDays) => "7일",
            (Language::Korean, Self::OneMonth) => "1개월",
            (Language::Korean, Self::ThreeMonths) => "3개월",
            (Language::Korean, Self::SixMonths) => "6개월",
        }
    }
}

impl fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForecastHorizon {
    type Err = LLMError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "7d" | "7일" => Ok(Self::SevenDays),
            "1mo" | "1개월" => Ok(Self::OneMonth),
            "3mo" | "3개월" => Ok(Self::ThreeMonths),
            "6mo" | "6개월" => Ok(Self::SixMonths),
            other => Err(LLMError::ConfigurationError(format!(
                "Invalid horizon: {other}. Supported: 7d, 1mo, 3mo, 6mo"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    fn parse(word: &str) -> Option<Self> {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        match word.as_str() {
            "up" | "상승" => Some(Self::Up),
            "down" | "하락" => Some(Self::Down),
            "flat" | "sideways" | "보합" => Some(Self::Flat),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Flat => "flat",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    fn parse(word: &str) -> Option<Self> {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        match word.as_str() {
            "high" | "상" => Some(Self::High),
            "medium" | "중" => Some(Self::Medium),
            "low" | "하" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        })
    }
}

/// Parsed model forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub horizon: ForecastHorizon,
    pub current_price: f64,
    pub predicted_price: Option<f64>,
    pub direction: Option<Direction>,
    pub confidence: Option<Confidence>,
    /// Predicted against current price, in percent
    pub change_percent: Option<f64>,
    /// `(lower, upper)` at ±10% of the predicted price
    pub band: Option<(f64, f64)>,
    pub raw: String,
}

/// Extract the structured fields from a forecast answer
pub fn parse_forecast(raw: &str, horizon: ForecastHorizon, current_price: f64) -> Forecast {
    let predicted_price = PREDICTED_PRICE
        .captures(raw)
        .and_then(|c| c[1].replace(',', "").parse::<f64>().ok())
        .filter(|p| p.is_finite() && *p > 0.0);
    let direction = DIRECTION.captures(raw).and_then(|c| Direction::parse(&c[1]));
    let confidence = CONFIDENCE.captures(raw).and_then(|c| Confidence::parse(&c[1]));

    let change_percent = predicted_price
        .filter(|_| current_price > 0.0)
        .map(|p| (p - current_price) / current_price * 100.0);
    let band = predicted_price.map(|p| (p * (1.0 - BAND_WIDTH), p * (1.0 + BAND_WIDTH)));

    Forecast {
        horizon,
        current_price,
        predicted_price,
        direction,
        confidence,
        change_percent,
        band,
        raw: raw.to_string(),
    }
}

/// Asks the model for a price target over a horizon
pub struct Forecaster {
    provider: Arc<dyn LLMProvider>,
    config: ModelConfig,
}

impl Forecaster {
    pub fn new(provider: Arc<dyn LLMProvider>, config: ModelConfig) -> Self {
        Self { provider, config }
    }

    #[instrument(skip(self, quote, snapshot, headlines), fields(symbol = %quote.symbol))]
    pub async fn forecast(
        &self,
        company: &str,
        quote: &PriceQuote,
        snapshot: &IndicatorSnapshot,
        headlines: &[Headline],
        horizon: ForecastHorizon,
    ) -> Result<Forecast> {
        let language = self.config.language;
        let (price, change) = price_vars(quote);
        let titles: Vec<&str> = headlines
            .iter()
            .take(FORECAST_HEADLINES)
            .map(|h| h.title.as_str())
            .collect();
        let horizon_label = horizon.label(language);

        let system = FORECAST_SYSTEM.render(
            language,
            &json!({
                "horizon": horizon_label,
                "price": price,
                "change": change,
                "indicators": indicator_rows(snapshot),
                "headlines": titles,
            }),
        )?;
        let prompt = FORECAST_USER.render(
            language,
            &json!({ "company": company, "horizon": horizon_label }),
        )?;

        let request = CompletionRequest::for_model(&self.config)
            .with_system(system)
            .with_prompt(prompt);

        let response = self.provider.complete(request).await?;
        let raw = response.text();
        if raw.is_empty() {
            let err = LLMError::UnexpectedResponse("Model returned an empty forecast".to_string());
            return Err(err.into());
        }

        let forecast = parse_forecast(&raw, horizon, quote.current_price);
        match forecast.predicted_price {
            Some(predicted) => info!(predicted, %horizon, "Forecast parsed"),
            None => warn!(%horizon, "Forecast answer carried no predicted price"),
        }
        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockLLMProvider;
    use crate::provider::fixtures::{reply, replying};
    use stock_core::Symbol;

    const KOREAN_ANSWER: &str = "예상주가: 78,650\n방향: 상승\n\n📊 예측 근거:\n- 골든크로스\n\n신뢰도: 중\n⚠️ 리스크: 환율";

    fn quote() -> PriceQuote {
        PriceQuote {
            symbol: Symbol::new("005930.KS"),
            current_price: 71_500.0,
            previous_price: 71_000.0,
            change_percent: Some(0.704),
        }
    }

    #[test]
    fn test_parse_korean_forecast() {
        let forecast = parse_forecast(KOREAN_ANSWER, ForecastHorizon::OneMonth, 71_500.0);
        assert_eq!(forecast.predicted_price, Some(78_650.0));
        assert_eq!(forecast.direction, Some(Direction::Up));
        assert_eq!(forecast.confidence, Some(Confidence::Medium));
        assert!((forecast.change_percent.unwrap() - 10.0).abs() < 1e-9);
        let (lower, upper) = forecast.band.unwrap();
        assert!((lower - 70_785.0).abs() < 1e-6);
        assert!((upper - 86_515.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_english_forecast() {
        let raw = "Predicted price: **182.5**\nDirection: down\n\nConfidence: Low\nRisks: rates";
        let forecast = parse_forecast(raw, ForecastHorizon::SevenDays, 189.46);
        assert_eq!(forecast.predicted_price, Some(182.5));
        assert_eq!(forecast.direction, Some(Direction::Down));
        assert_eq!(forecast.confidence, Some(Confidence::Low));
        assert!(forecast.change_percent.unwrap() < 0.0);
    }

    #[test]
    fn test_unparseable_forecast_keeps_raw_text() {
        let forecast =
            parse_forecast("I cannot predict prices.", ForecastHorizon::SixMonths, 100.0);
        assert_eq!(forecast.predicted_price, None);
        assert_eq!(forecast.band, None);
        assert_eq!(forecast.direction, None);
        assert_eq!(forecast.raw, "I cannot predict prices.");
    }

    #[test]
    fn test_horizon_parsing() {
        assert_eq!("3mo".parse::<ForecastHorizon>().unwrap(), ForecastHorizon::ThreeMonths);
        assert_eq!("7일".parse::<ForecastHorizon>().unwrap(), ForecastHorizon::SevenDays);
        assert!("2y".parse::<ForecastHorizon>().is_err());
        assert_eq!(ForecastHorizon::SixMonths.days(), 180);
    }

    #[tokio::test]
    async fn test_forecast_prompt_carries_top_headlines() {
        let mut provider = MockLLMProvider::new();
        provider
            .expect_complete()
            .withf(|request| {
                let system = request.system.as_deref().unwrap_or_default();
                system.contains("1개월 후 주가를 예측")
                    && system.contains("현재가: 71,500원")
                    && system.contains("- news 3")
                    && !system.contains("- news 4")
                    && request.prompt() == "삼성전자 1개월 주가 예측"
            })
            .times(1)
            .returning(|_| Ok(reply(KOREAN_ANSWER)));

        let headlines: Vec<Headline> = (1..=5)
            .map(|i| Headline {
                title: format!("news {i}"),
                published: None,
                link: None,
            })
            .collect();
        let forecaster = Forecaster::new(
            Arc::new(provider),
            ModelConfig::default().with_language(Language::Korean),
        );
        let forecast = forecaster
            .forecast(
                "삼성전자",
                &quote(),
                &IndicatorSnapshot::default(),
                &headlines,
                ForecastHorizon::OneMonth,
            )
            .await
            .unwrap();
        assert_eq!(forecast.predicted_price, Some(78_650.0));
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error() {
        let forecaster = Forecaster::new(Arc::new(replying("")), ModelConfig::default());
        let result = forecaster
            .forecast(
                "Apple",
                &quote(),
                &IndicatorSnapshot::default(),
                &[],
                ForecastHorizon::SevenDays,
            )
            .await;
        assert!(result.is_err());
    }
}
