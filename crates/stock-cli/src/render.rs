//! Terminal rendering of pipeline results

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use std::fmt::Write as _;
use stock_core::{
    AnalysisReport, Headline, IndicatorSnapshot, Market, MarketContext, PriceQuote,
    SentimentReport, Symbol,
};
use stock_llm::Forecast;

fn table(header: [&str; 2]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn optional(value: Option<f64>, format: impl Fn(f64) -> String) -> String {
    value.map_or_else(|| "n/a".to_string(), format)
}

fn percent(value: f64) -> String {
    format!("{value:+.2}%")
}

/// One indicator value, formatted for its unit
fn format_indicator(name: &str, value: Option<f64>, market: Market) -> String {
    match name {
        "current_price" | "period_high" | "period_low" | "ma5" | "ma20" | "ma60" | "bb_upper"
        | "bb_middle" | "bb_lower" => optional(value, |v| market.format_price(v)),
        "period_return" => optional(value, percent),
        "bb_position" | "volatility" | "volume_ratio" => optional(value, |v| format!("{v:.2}%")),
        _ => optional(value, |v| format!("{v:.2}")),
    }
}

pub fn quote(quote: &PriceQuote) -> String {
    let market = quote.symbol.market();
    let change = optional(quote.change_percent, percent);
    format!(
        "{}  {}  ({change} vs previous close {})",
        quote.symbol,
        market.format_price(quote.current_price),
        market.format_price(quote.previous_price),
    )
}

pub fn indicators(symbol: &Symbol, snapshot: &IndicatorSnapshot) -> String {
    let market = symbol.market();
    let mut table = table(["Indicator", "Value"]);
    for (name, value) in snapshot.entries() {
        table.add_row([name.to_string(), format_indicator(name, value, market)]);
    }
    if let Some(cross) = snapshot.cross {
        table.add_row(["cross_signal".to_string(), cross.to_string()]);
    }
    format!("{symbol} ({} bars)\n{table}", snapshot.bars)
}

/// Headlines with labels when a sentiment report is available
pub fn news(headlines: &[Headline], sentiment: &SentimentReport) -> String {
    if headlines.is_empty() {
        return "No headlines found".to_string();
    }

    let mut table = table(["Sentiment", "Headline"]);
    for headline in headlines {
        let label = sentiment
            .headlines
            .iter()
            .find(|scored| scored.headline == headline.title)
            .map_or_else(|| "unscored".to_string(), |scored| scored.label.to_string());
        table.add_row([label, headline.title.clone()]);
    }
    format!("{table}\nSentiment score: {}", sentiment.score)
}

fn context(context: &MarketContext, market: Market) -> Option<String> {
    if context.is_empty() {
        return None;
    }

    let mut table = table(["Context", "Value"]);
    if let Some(fundamentals) = &context.fundamentals {
        if let Some(name) = &fundamentals.name {
            table.add_row(["name".to_string(), name.clone()]);
        }
        table.add_row([
            "P/E".to_string(),
            optional(fundamentals.valuation.pe_ratio, |v| format!("{v:.2}")),
        ]);
        table.add_row([
            "P/B".to_string(),
            optional(fundamentals.valuation.price_to_book, |v| format!("{v:.2}")),
        ]);
        table.add_row([
            "profit margin".to_string(),
            optional(fundamentals.profitability.profit_margin, |v| format!("{v:.2}%")),
        ]);
        table.add_row([
            "52w range".to_string(),
            match (fundamentals.other.week52_low, fundamentals.other.week52_high) {
                (Some(low), Some(high)) => format!(
                    "{} - {}",
                    market.format_price(low),
                    market.format_price(high)
                ),
                _ => "n/a".to_string(),
            },
        ]);
    }
    if let Some(holdings) = &context.holdings {
        table.add_row([
            "institutional".to_string(),
            optional(holdings.institutional_percent, |v| format!("{v:.1}%")),
        ]);
    }
    for peer in &context.peers {
        let market = peer.symbol.market();
        table.add_row([
            format!("peer {}", peer.symbol),
            format!(
                "{} ({})",
                market.format_price(peer.last_close),
                optional(peer.period_return, percent)
            ),
        ]);
    }
    if let Some(macro_snapshot) = &context.macro_snapshot {
        let rate = |v: f64| format!("{v:.2}%");
        table.add_row(["fed funds".to_string(), optional(macro_snapshot.fed_funds_rate, rate)]);
        table.add_row(["10y treasury".to_string(), optional(macro_snapshot.treasury_10y, rate)]);
        table.add_row(["CPI (YoY)".to_string(), optional(macro_snapshot.cpi, rate)]);
        table.add_row(["VIX".to_string(), optional(macro_snapshot.vix, |v| format!("{v:.2}"))]);
        if macro_snapshot.yield_curve_inverted == Some(true) {
            table.add_row(["yield curve".to_string(), "inverted".to_string()]);
        }
    }
    Some(table.to_string())
}

pub fn report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({}, {})", report.query, report.symbol, report.period);
    let _ = writeln!(out, "{}", quote(&report.quote));
    let _ = writeln!(out, "\n{}", indicators(&report.symbol, &report.snapshot));

    let _ = writeln!(out, "\nRecommendation: {}", report.verdict.recommendation);
    for factor in &report.verdict.positive_factors {
        let _ = writeln!(out, "  + {factor}");
    }
    for factor in &report.verdict.negative_factors {
        let _ = writeln!(out, "  - {factor}");
    }

    let _ = writeln!(out, "\nNews sentiment: {}", report.sentiment.score);
    for scored in &report.sentiment.headlines {
        let _ = writeln!(out, "  [{}] {}", scored.label, scored.headline);
    }

    if let Some(context) = context(&report.context, report.symbol.market()) {
        let _ = writeln!(out, "\n{context}");
    }
    if let Some(narrative) = &report.narrative {
        let _ = writeln!(out, "\n{narrative}");
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out.trim_end().to_string()
}

pub fn forecast(company: &str, symbol: &Symbol, forecast: &Forecast) -> String {
    let market = symbol.market();
    let mut table = table(["Forecast", "Value"]);
    table.add_row([
        "horizon".to_string(),
        format!("{} ({} days)", forecast.horizon, forecast.horizon.days()),
    ]);
    table.add_row(["current price".to_string(), market.format_price(forecast.current_price)]);
    table.add_row([
        "predicted price".to_string(),
        optional(forecast.predicted_price, |v| market.format_price(v)),
    ]);
    table.add_row(["change".to_string(), optional(forecast.change_percent, percent)]);
    if let Some((lower, upper)) = forecast.band {
        table.add_row([
            "band".to_string(),
            format!("{} - {}", market.format_price(lower), market.format_price(upper)),
        ]);
    }
    if let Some(direction) = forecast.direction {
        table.add_row(["direction".to_string(), direction.to_string()]);
    }
    if let Some(confidence) = forecast.confidence {
        table.add_row(["confidence".to_string(), confidence.to_string()]);
    }
    format!("{company} ({symbol})\n{table}\n\n{}", forecast.raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stock_core::sentiment::ScoredHeadline;
    use stock_core::{SentimentLabel, SentimentScore};

    #[test]
    fn test_format_indicator_units() {
        assert_eq!(format_indicator("ma5", Some(71_500.4), Market::Korea), "71,500원");
        assert_eq!(format_indicator("period_return", Some(3.456), Market::Us), "+3.46%");
        assert_eq!(format_indicator("rsi", Some(61.0), Market::Us), "61.00");
        assert_eq!(format_indicator("volatility", None, Market::Us), "n/a");
    }

    #[test]
    fn test_quote_line() {
        let quote = PriceQuote {
            symbol: Symbol::new("AAPL"),
            current_price: 189.46,
            previous_price: 187.0,
            change_percent: Some(1.316),
        };
        assert_eq!(super::quote(&quote), "AAPL  $189.46  (+1.32% vs previous close $187.00)");
    }

    #[test]
    fn test_indicator_table_lists_every_entry() {
        let snapshot = IndicatorSnapshot {
            bars: 3,
            rsi: Some(55.0),
            ..Default::default()
        };
        let rendered = indicators(&Symbol::new("AAPL"), &snapshot);
        assert!(rendered.starts_with("AAPL (3 bars)"));
        assert!(rendered.contains("volume_ratio"));
        assert!(rendered.contains("55.00"));
    }

    #[test]
    fn test_news_marks_unscored_headlines() {
        let headlines = vec![
            Headline::new("Apple beats estimates"),
            Headline::new("Apple event today"),
        ];
        let sentiment = SentimentReport {
            score: SentimentScore::new(100.0),
            headlines: vec![ScoredHeadline {
                headline: "Apple beats estimates".to_string(),
                label: SentimentLabel::Positive,
            }],
            skipped: 1,
        };
        let rendered = news(&headlines, &sentiment);
        assert!(rendered.contains("positive"));
        assert!(rendered.contains("unscored"));
        assert!(rendered.ends_with("Sentiment score: +100.0"));
        assert_eq!(news(&[], &SentimentReport::default()), "No headlines found");
    }

    #[test]
    fn test_empty_context_is_not_rendered() {
        assert!(context(&MarketContext::default(), Market::Us).is_none());
    }
}
