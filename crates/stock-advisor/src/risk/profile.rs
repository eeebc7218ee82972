//! Risk Profile Assembler

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::scorer::{RiskScorer, annualized_volatility};
use super::suggestions::SuggestionSampler;
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::market::{HistoryPeriod, Interval, MarketDataClient, normalize_ticker, with_timeout};
use crate::model::{PriceBar, RiskProfile, TickerMetadata, money};

/// Bars for a period plus the risk inputs derived from them
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceHistory {
    pub ticker: String,
    pub period: HistoryPeriod,
    pub interval: Interval,
    pub bars: Vec<PriceBar>,
    pub volatility: f64,
    pub beta: f64,
}

pub struct RiskProfiler {
    market: Arc<dyn MarketDataClient>,
    scorer: RiskScorer,
    sampler: SuggestionSampler,
    fetch_timeout: Duration,
}

impl RiskProfiler {
    pub fn new(market: Arc<dyn MarketDataClient>, config: &AdvisorConfig) -> Self {
        Self {
            sampler: SuggestionSampler::new(market.clone(), config.market_timeout),
            scorer: RiskScorer::new(config.salary_benchmark),
            fetch_timeout: config.market_timeout,
            market,
        }
    }

    /// Score a ticker for a user's salary and attach alternative suggestions.
    pub async fn profile<R>(&self, ticker: &str, salary: Decimal, rng: &mut R) -> Result<RiskProfile>
    where
        R: Rng + Send,
    {
        if salary <= Decimal::ZERO {
            return Err(AdvisorError::InvalidInput("salary must be a positive amount".into()));
        }
        let ticker = normalize_ticker(ticker)?;

        let bars = self.daily_history(&ticker, HistoryPeriod::OneYear).await?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let meta = self.metadata_or_default(&ticker).await;

        let volatility = annualized_volatility(&closes);
        let beta = meta.beta.filter(|b| b.is_finite()).unwrap_or(1.0);
        let price = meta
            .last_price
            .or_else(|| closes.last().copied())
            .unwrap_or_default();

        let assessment = self.scorer.score(volatility, beta, salary)?;
        let suggested_stocks = self.sampler.suggest(assessment.score, &ticker, rng).await?;

        info!(
            "Risk profile for {}: score {:.2} ({}), volatility {:.4}",
            ticker,
            assessment.score,
            assessment.level.as_str(),
            volatility
        );

        Ok(RiskProfile {
            ticker,
            price: money(price),
            volatility,
            beta,
            user_salary: salary,
            risk_score: round2(assessment.score),
            risk_level: assessment.level,
            suggestion_message: suggestion_message(volatility),
            suggested_stocks,
        })
    }

    /// Bars for any period and interval, with annualized volatility and beta.
    pub async fn history(&self, ticker: &str, period: HistoryPeriod, interval: Interval) -> Result<PriceHistory> {
        let ticker = normalize_ticker(ticker)?;
        let bars = with_timeout(
            self.market.name(),
            self.fetch_timeout,
            self.market.fetch_history(&ticker, period, interval),
        )
        .await?;

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let meta = self.metadata_or_default(&ticker).await;

        Ok(PriceHistory {
            volatility: annualized_volatility(&closes),
            beta: meta.beta.unwrap_or(1.0),
            ticker,
            period,
            interval,
            bars,
        })
    }

    async fn daily_history(&self, ticker: &str, period: HistoryPeriod) -> Result<Vec<PriceBar>> {
        let bars = with_timeout(
            self.market.name(),
            self.fetch_timeout,
            self.market.fetch_history(ticker, period, Interval::OneDay),
        )
        .await?;

        if bars.is_empty() {
            return Err(AdvisorError::DataInsufficient(format!(
                "no price history for {}",
                ticker
            )));
        }
        Ok(bars)
    }

    async fn metadata_or_default(&self, ticker: &str) -> TickerMetadata {
        match with_timeout(self.market.name(), self.fetch_timeout, self.market.fetch_metadata(ticker)).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Metadata unavailable for {}, using last close and beta 1.0: {}", ticker, e);
                TickerMetadata::default()
            }
        }
    }
}

pub fn suggestion_message(volatility: f64) -> String {
    format!(
        "Volatility: {:.2}%. Suggested based on your risk profile.",
        volatility * 100.0
    )
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
