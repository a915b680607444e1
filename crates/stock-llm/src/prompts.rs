//! Prompt templates
//!
//! Every prompt exists in English and Korean and is rendered with MiniJinja.

use crate::{LLMError, Result};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use stock_core::{IndicatorSnapshot, PriceQuote};
use std::fmt;
use std::str::FromStr;

/// Output language for prompts and generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Korean,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Korean => "ko",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ko" | "kr" | "korean" | "한국어" => Ok(Language::Korean),
            other => Err(LLMError::ConfigurationError(format!(
                "Unsupported language: {other}. Supported: en, ko"
            ))),
        }
    }
}

/// A named prompt with one template per language
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub english: &'static str,
    pub korean: &'static str,
}

impl PromptTemplate {
    pub fn source(&self, language: Language) -> &'static str {
        match language {
            Language::English => self.english,
            Language::Korean => self.korean,
        }
    }

    /// Render with `vars`; undefined variables are an error
    pub fn render<S: Serialize>(&self, language: Language, vars: &S) -> Result<String> {
        let mut env = Environment::new();
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        env.add_template(self.name, self.source(language))?;
        let rendered = env.get_template(self.name)?.render(minijinja::Value::from_serialize(vars))?;
        Ok(rendered.trim().to_string())
    }
}

pub const HEADLINE_CLASSIFIER_SYSTEM: PromptTemplate = PromptTemplate {
    name: "headline_classifier_system",
    english: "You classify financial news headlines by their likely effect on the company's stock. \
Answer with exactly one word: positive, negative or neutral.\n\
Positive signals: earnings improvement, new products, investment expansion, order wins, partnerships.\n\
Negative signals: earnings deterioration, recalls, lawsuits, layoffs, losses.",
    korean: "당신은 금융 뉴스 제목이 해당 회사 주가에 미칠 영향을 분류합니다. \
반드시 한 단어로만 답하세요: 긍정, 부정, 중립.\n\
긍정 키워드: 실적 개선, 신제품, 투자 확대, 수주, 협력\n\
부정 키워드: 실적 악화, 리콜, 소송, 감원, 적자",
};

pub const HEADLINE_CLASSIFIER_USER: PromptTemplate = PromptTemplate {
    name: "headline_classifier_user",
    english: "Headline: {{ headline }}",
    korean: "뉴스 제목: {{ headline }}",
};

pub const ANALYST_SYSTEM: PromptTemplate = PromptTemplate {
    name: "analyst_system",
    english: "You are a stock analyst. Write a concise commentary on the data you are given. \
Start with an overall call (consider buying / consider selling / wait and see) consistent with the \
computed recommendation, then list the positive factors, the negative factors and what the news \
suggests. Use only the numbers provided. End with: \
\"Investment decisions are your own responsibility; this analysis is for reference only.\"",
    korean: "당신은 주식 애널리스트입니다. 주어진 데이터로 간결한 분석을 작성하세요. \
계산된 추천과 일치하는 종합 판단(매수 고려 / 매도 고려 / 관망 추천)으로 시작하고, \
긍정 요인, 부정 요인, 뉴스 분석을 차례로 정리하세요. 제공된 수치만 사용하세요. \
마지막에 \"⚠️ 투자 판단은 본인의 책임이며, 이 분석은 참고용입니다.\"를 덧붙이세요. \
반드시 한글로 답변하세요.",
};

pub const ANALYST_USER: PromptTemplate = PromptTemplate {
    name: "analyst_user",
    english: r"Company: {{ query }} ({{ symbol }})
Current price: {{ price }}{% if change %} ({{ change }} vs previous close){% endif %}
Period: {{ period }}

Indicators:
{% for item in indicators %}- {{ item.name }}: {{ item.value }}
{% endfor %}
Computed recommendation: {{ recommendation }}
Positive factors:
{% for factor in positives %}- {{ factor }}
{% else %}- none
{% endfor %}
Negative factors:
{% for factor in negatives %}- {{ factor }}
{% else %}- none
{% endfor %}
News sentiment: {{ sentiment }}
{% for item in headlines %}- [{{ item.label }}] {{ item.headline }}
{% endfor %}{% if context %}
Additional context (JSON):
{{ context }}{% endif %}",
    korean: r"회사: {{ query }} ({{ symbol }})
현재가: {{ price }}{% if change %} (전일 대비 {{ change }}){% endif %}
분석 기간: {{ period }}

기술적 지표:
{% for item in indicators %}- {{ item.name }}: {{ item.value }}
{% endfor %}
계산된 추천: {{ recommendation }}
긍정 요인:
{% for factor in positives %}- {{ factor }}
{% else %}- 없음
{% endfor %}
부정 요인:
{% for factor in negatives %}- {{ factor }}
{% else %}- 없음
{% endfor %}
뉴스 감성 점수: {{ sentiment }}
{% for item in headlines %}- [{{ item.label }}] {{ item.headline }}
{% endfor %}{% if context %}
추가 정보 (JSON):
{{ context }}{% endif %}",
};

pub const FORECAST_SYSTEM: PromptTemplate = PromptTemplate {
    name: "forecast_system",
    english: r"You are a professional stock analyst. Combine the data below and forecast the price {{ horizon }} from now.

Current price: {{ price }}{% if change %} ({{ change }} vs previous close){% endif %}

Technical indicators:
{% for item in indicators %}- {{ item.name }}: {{ item.value }}
{% endfor %}
Recent news:
{% for title in headlines %}- {{ title }}
{% else %}- none
{% endfor %}
Answer in exactly this format:
Predicted price: [number only, no units]
Direction: [up/down/flat]

Rationale:
- [technical reasoning]
- [news impact]
- [market conditions]

Confidence: [high/medium/low]
Risks: [main risk factors]",
    korean: r"당신은 전문 주식 애널리스트입니다. 다음 데이터를 종합 분석하여 {{ horizon }} 후 주가를 예측하세요.

현재가: {{ price }}{% if change %} (전일 대비 {{ change }}){% endif %}

기술적 분석:
{% for item in indicators %}- {{ item.name }}: {{ item.value }}
{% endfor %}
최근 뉴스:
{% for title in headlines %}- {{ title }}
{% else %}- 없음
{% endfor %}
출력 형식 (정확히 따르세요):
예상주가: [숫자만, 단위 없이]
방향: [상승/하락/보합]

📊 예측 근거:
- [기술적 분석 근거]
- [뉴스 영향]
- [시장 상황]

신뢰도: [상/중/하]
⚠️ 리스크: [주요 위험 요인]",
};

pub const FORECAST_USER: PromptTemplate = PromptTemplate {
    name: "forecast_user",
    english: "Forecast the {{ company }} share price {{ horizon }} from now.",
    korean: "{{ company }} {{ horizon }} 주가 예측",
};

/// `{name, value}` rows for every indicator, absent ones shown as `n/a`
pub(crate) fn indicator_rows(snapshot: &IndicatorSnapshot) -> Vec<Value> {
    let mut rows: Vec<Value> = snapshot
        .entries()
        .into_iter()
        .map(|(name, value)| {
            let value = value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
            json!({ "name": name, "value": value })
        })
        .collect();
    if let Some(cross) = snapshot.cross {
        rows.push(json!({ "name": "cross_signal", "value": cross.to_string() }));
    }
    rows
}

/// Currency-aware price and signed change, as shown to the model
pub(crate) fn price_vars(quote: &PriceQuote) -> (String, Option<String>) {
    let price = quote.symbol.market().format_price(quote.current_price);
    let change = quote.change_percent.map(|c| format!("{c:+.2}%"));
    (price, change)
}
