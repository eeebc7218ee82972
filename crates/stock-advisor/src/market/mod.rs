//! Market Data Integration
//!
//! Abstractions over market-data and news providers, plus the Yahoo Finance,
//! NewsAPI and mock implementations.

mod merged;
mod mock;
mod newsapi;
mod yahoo;
mod yahoo_news;

pub use merged::MergedNewsClient;
pub use mock::{MockMarketData, MockNewsClient};
pub use newsapi::NewsApiClient;
pub use yahoo::YahooFinanceClient;
pub use yahoo_news::YahooNewsClient;

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};
use crate::model::{NewsArticle, PriceBar, TickerMetadata};

/// Look-back range for a history request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
}

impl HistoryPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPeriod::OneDay => "1d",
            HistoryPeriod::FiveDays => "5d",
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
        }
    }

    /// Approximate number of trading days covered
    pub fn trading_days(&self) -> usize {
        match self {
            HistoryPeriod::OneDay => 1,
            HistoryPeriod::FiveDays => 5,
            HistoryPeriod::OneMonth => 21,
            HistoryPeriod::ThreeMonths => 63,
            HistoryPeriod::SixMonths => 126,
            HistoryPeriod::OneYear => 252,
            HistoryPeriod::TwoYears => 504,
        }
    }
}

impl FromStr for HistoryPeriod {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Ok(HistoryPeriod::OneDay),
            "5d" | "7d" => Ok(HistoryPeriod::FiveDays),
            "1mo" => Ok(HistoryPeriod::OneMonth),
            "3mo" => Ok(HistoryPeriod::ThreeMonths),
            "6mo" => Ok(HistoryPeriod::SixMonths),
            "1y" => Ok(HistoryPeriod::OneYear),
            "2y" => Ok(HistoryPeriod::TwoYears),
            other => Err(AdvisorError::InvalidInput(format!("unsupported period '{}'", other))),
        }
    }
}

/// Bar spacing for a history request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1wk")]
    OneWeek,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::OneWeek => "1wk",
        }
    }
}

impl FromStr for Interval {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1h" | "60m" => Ok(Interval::OneHour),
            "1d" => Ok(Interval::OneDay),
            "1wk" => Ok(Interval::OneWeek),
            other => Err(AdvisorError::InvalidInput(format!("unsupported interval '{}'", other))),
        }
    }
}

/// Market data client trait (Strategy pattern)
///
/// Implement this for each provider: Yahoo Finance, Alpha Vantage, a cache, etc.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Chronological bars for a ticker; `NotFound` if the ticker is unknown
    /// or has no data in range
    async fn fetch_history(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        interval: Interval,
    ) -> Result<Vec<PriceBar>>;

    /// Latest price, beta and display name; any field may be absent
    async fn fetch_metadata(&self, ticker: &str) -> Result<TickerMetadata>;

    /// Provider name
    fn name(&self) -> &str;
}

/// News provider trait
#[async_trait]
pub trait NewsClient: Send + Sync {
    /// Recent articles, newest first
    async fn fetch_recent(&self, ticker: &str) -> Result<Vec<NewsArticle>>;

    fn name(&self) -> &str;
}

/// Run an upstream call under a deadline, mapping elapse to `Timeout`.
pub async fn with_timeout<T, F>(source_name: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{} call exceeded {:?}", source_name, limit);
            Err(AdvisorError::Timeout {
                source_name: source_name.to_string(),
                secs: limit.as_secs(),
            })
        }
    }
}

/// Validate and upper-case a ticker symbol
pub fn normalize_ticker(ticker: &str) -> Result<String> {
    let ticker = ticker.trim();
    let valid_chars = ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));

    if ticker.is_empty() || ticker.len() > 12 || !valid_chars {
        return Err(AdvisorError::InvalidInput(format!("malformed ticker '{}'", ticker)));
    }

    Ok(ticker.to_uppercase())
}
