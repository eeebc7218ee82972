//! Domain Models
//!
//! Core data types shared by the indicator, risk and prediction pipelines.
//! Prices and salaries surfaced to callers use `rust_decimal`; statistical
//! inputs (bars, indicators, probabilities) stay in `f64`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV bar
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { timestamp, open, high, low, close, volume }
    }
}

/// Normalize a raw bar series: chronological, unique timestamps, positive closes.
pub fn normalize_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.retain(|b| b.close.is_finite() && b.close > 0.0);
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    bars
}

/// Instrument metadata. Providers may omit any field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerMetadata {
    pub last_price: Option<f64>,
    pub beta: Option<f64>,
    pub short_name: Option<String>,
}

/// A news item about an instrument
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub summary: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
    pub url: String,
}

impl NewsArticle {
    /// Text fed to the sentiment collaborator
    pub fn sentiment_text(&self) -> String {
        format!("{} {}", self.title, self.summary).trim().to_string()
    }
}

/// Discrete risk tier derived from the composite score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 75.0 {
            RiskLevel::VeryHigh
        } else if score > 55.0 {
            RiskLevel::High
        } else if score > 35.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        }
    }
}

/// Coarse stance derived only from the risk tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskAction {
    Buy,
    Hold,
    Sell,
}

impl From<RiskLevel> for RiskAction {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => RiskAction::Buy,
            RiskLevel::Moderate => RiskAction::Hold,
            RiskLevel::High | RiskLevel::VeryHigh => RiskAction::Sell,
        }
    }
}

/// An alternative instrument offered alongside a risk profile
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestedStock {
    pub ticker: String,
    pub name: String,
    pub price: Decimal,
    pub beta: f64,
}

impl SuggestedStock {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>, price: f64, beta: f64) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            name: name.into(),
            price: money(price),
            beta,
        }
    }
}

/// Per-user, per-instrument risk profile
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskProfile {
    pub ticker: String,
    pub price: Decimal,
    pub volatility: f64,
    pub beta: f64,
    pub user_salary: Decimal,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub suggestion_message: String,
    pub suggested_stocks: Vec<SuggestedStock>,
}

impl RiskProfile {
    pub fn action(&self) -> RiskAction {
        self.risk_level.into()
    }
}

/// Simple risk-tier stance for an instrument
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskRecommendation {
    pub ticker: String,
    pub current_price: Decimal,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub recommendation: RiskAction,
    pub note: String,
}

impl From<&RiskProfile> for RiskRecommendation {
    fn from(profile: &RiskProfile) -> Self {
        Self {
            ticker: profile.ticker.clone(),
            current_price: profile.price,
            risk_score: profile.risk_score,
            risk_level: profile.risk_level,
            recommendation: profile.action(),
            note: profile.suggestion_message.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong Buy",
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Sell => "Sell",
            Recommendation::StrongSell => "Strong Sell",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polarity label for a sentiment score or text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.1 {
            SentimentLabel::Positive
        } else if score < -0.1 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Scalar used when a collaborator only returns a label
    pub fn score(&self) -> f64 {
        match self {
            SentimentLabel::Positive => 1.0,
            SentimentLabel::Negative => -1.0,
            SentimentLabel::Neutral => 0.0,
        }
    }

    /// Parse a free-form model reply ("Positive.", "the sentiment is negative", ...)
    pub fn parse_reply(reply: &str) -> Self {
        let reply = reply.to_lowercase();
        if reply.contains("positive") {
            SentimentLabel::Positive
        } else if reply.contains("negative") {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// Model output mapped to a direction and an action
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub direction: Direction,
    /// max(p_up, p_down) in percent
    pub confidence: f64,
    pub probability_up: f64,
    pub probability_down: f64,
    pub expected_return_percent: f64,
    pub recommendation: Recommendation,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub news_sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
}

/// Indicator values echoed back with a prediction
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub current_price: f64,
    pub rsi: f64,
    pub macd: f64,
    /// 20-bar return volatility in percent
    pub volatility: f64,
    pub volume_ratio: f64,
}

/// Full response of the prediction pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PredictionReport {
    pub symbol: String,
    pub prediction: PredictionResult,
    pub sentiment_analysis: SentimentAnalysis,
    pub technical_indicators: TechnicalSnapshot,
    pub recommendation: Recommendation,
    pub timestamp: DateTime<Utc>,
}

/// News item labeled with its sentiment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnotatedArticle {
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub link: String,
    pub sentiment: SentimentLabel,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Convert a provider float into a monetary value
pub fn money(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(4))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(75.01), RiskLevel::VeryHigh);
        assert_eq!(RiskLevel::from_score(75.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(55.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(35.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::Low);
    }

    #[test]
    fn test_risk_action() {
        assert_eq!(RiskAction::from(RiskLevel::Low), RiskAction::Buy);
        assert_eq!(RiskAction::from(RiskLevel::Moderate), RiskAction::Hold);
        assert_eq!(RiskAction::from(RiskLevel::VeryHigh), RiskAction::Sell);
    }

    #[test]
    fn test_serialized_labels() {
        assert_eq!(serde_json::to_string(&RiskLevel::VeryHigh).unwrap(), "\"Very High\"");
        assert_eq!(serde_json::to_string(&Recommendation::StrongSell).unwrap(), "\"Strong Sell\"");
        assert_eq!(serde_json::to_string(&RiskAction::Hold).unwrap(), "\"HOLD\"");
    }

    #[test]
    fn test_sentiment_label() {
        assert_eq!(SentimentLabel::from_score(0.11), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.2), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::parse_reply("Negative."), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::parse_reply("  POSITIVE"), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::parse_reply(""), SentimentLabel::Neutral);
    }

    #[test]
    fn test_normalize_bars() {
        let t = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
        let bars = vec![
            PriceBar::new(t(3), 1.0, 1.0, 1.0, 12.0, 10.0),
            PriceBar::new(t(1), 1.0, 1.0, 1.0, 10.0, 10.0),
            PriceBar::new(t(2), 1.0, 1.0, 1.0, 0.0, 10.0),
            PriceBar::new(t(1), 1.0, 1.0, 1.0, 11.0, 10.0),
        ];
        let bars = normalize_bars(bars);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, t(1));
        assert_eq!(bars[1].close, 12.0);
    }

    #[test]
    fn test_money() {
        assert_eq!(money(123.456789), dec!(123.4568));
        assert_eq!(money(f64::NAN), Decimal::ZERO);
    }
}
