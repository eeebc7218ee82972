//! Mock Market Data
//!
//! For testing and demo purposes. Serves deterministic synthetic bars and
//! realistic static metadata, with optional failure injection.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

use super::{HistoryPeriod, Interval, MarketDataClient, NewsClient};
use crate::error::{AdvisorError, Result};
use crate::model::{NewsArticle, PriceBar, TickerMetadata};

/// Mock market-data provider with static quotes
#[derive(Default)]
pub struct MockMarketData {
    unavailable: HashSet<String>,
    missing_price: HashSet<String>,
    latency: Option<Duration>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tickers whose every call fails as an upstream outage
    pub fn with_unavailable(mut self, tickers: &[&str]) -> Self {
        self.unavailable.extend(tickers.iter().map(|t| t.to_uppercase()));
        self
    }

    /// Tickers whose metadata comes back without a price
    pub fn with_missing_price(mut self, tickers: &[&str]) -> Self {
        self.missing_price.extend(tickers.iter().map(|t| t.to_uppercase()));
        self
    }

    /// Delay every call (for timeout tests)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// (price, name, beta)
    fn quote(symbol: &str) -> Option<(f64, &'static str, f64)> {
        let quote = match symbol {
            // High volatility
            "TSLA" => (248.50, "Tesla, Inc.", 2.31),
            "NVDA" => (131.20, "NVIDIA Corporation", 1.68),
            "COIN" => (265.10, "Coinbase Global, Inc.", 3.45),
            "AMD" => (141.90, "Advanced Micro Devices, Inc.", 1.70),
            "SHOP" => (104.30, "Shopify Inc.", 2.58),
            "SQ" => (82.40, "Block, Inc.", 2.46),
            "META" => (585.00, "Meta Platforms, Inc.", 1.21),
            "NFLX" => (760.20, "Netflix, Inc.", 1.27),
            "PLTR" => (64.10, "Palantir Technologies Inc.", 2.68),
            "AFRM" => (52.30, "Affirm Holdings, Inc.", 3.62),
            "RIVN" => (12.10, "Rivian Automotive, Inc.", 2.05),
            "SNAP" => (11.60, "Snap Inc.", 1.83),
            "UBER" => (72.80, "Uber Technologies, Inc.", 1.38),
            "ABNB" => (136.50, "Airbnb, Inc.", 1.15),
            "CRWD" => (345.70, "CrowdStrike Holdings, Inc.", 1.18),
            "DDOG" => (151.00, "Datadog, Inc.", 1.12),
            "ROKU" => (78.20, "Roku, Inc.", 2.02),
            "LI" => (23.40, "Li Auto Inc.", 1.05),
            // Medium volatility
            "AAPL" => (229.00, "Apple Inc.", 1.24),
            "MSFT" => (418.20, "Microsoft Corporation", 0.90),
            "AMZN" => (207.90, "Amazon.com, Inc.", 1.15),
            "GOOG" => (176.50, "Alphabet Inc.", 1.01),
            "GOOGL" => (175.30, "Alphabet Inc.", 1.01),
            "V" => (305.10, "Visa Inc.", 0.95),
            "MA" => (512.60, "Mastercard Incorporated", 1.10),
            "JPM" => (246.00, "JPMorgan Chase & Co.", 1.09),
            "COST" => (935.40, "Costco Wholesale Corporation", 0.79),
            "AVGO" => (171.20, "Broadcom Inc.", 1.17),
            "ORCL" => (187.40, "Oracle Corporation", 1.01),
            "HD" => (410.80, "The Home Depot, Inc.", 1.00),
            "ADBE" => (497.30, "Adobe Inc.", 1.30),
            "INTC" => (24.20, "Intel Corporation", 1.05),
            "CSCO" => (58.70, "Cisco Systems, Inc.", 0.84),
            "QCOM" => (160.50, "QUALCOMM Incorporated", 1.26),
            "TXN" => (199.30, "Texas Instruments Incorporated", 0.99),
            "DIS" => (113.60, "The Walt Disney Company", 1.40),
            // Low volatility
            "PG" => (168.90, "The Procter & Gamble Company", 0.42),
            "JNJ" => (155.20, "Johnson & Johnson", 0.52),
            "KO" => (64.10, "The Coca-Cola Company", 0.61),
            "MCD" => (296.00, "McDonald's Corporation", 0.71),
            "PEP" => (152.80, "PepsiCo, Inc.", 0.55),
            "MRK" => (99.60, "Merck & Co., Inc.", 0.39),
            "WMT" => (90.40, "Walmart Inc.", 0.51),
            "UNH" => (507.70, "UnitedHealth Group Incorporated", 0.58),
            "CVS" => (56.30, "CVS Health Corporation", 0.53),
            "T" => (22.80, "AT&T Inc.", 0.60),
            "VZ" => (40.10, "Verizon Communications Inc.", 0.43),
            "PFE" => (26.50, "Pfizer Inc.", 0.63),
            _ => return None,
        };
        Some(quote)
    }

    async fn simulate(&self, symbol: &str) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.contains(symbol) {
            return Err(AdvisorError::upstream("MockMarketData", format!("{} feed offline", symbol)));
        }
        Ok(())
    }

    /// Deterministic bars ending at a fixed date; swing grows with beta
    fn synthetic_bars(symbol: &str, price: f64, beta: f64, count: usize, step: ChronoDuration) -> Vec<PriceBar> {
        let seed = symbol.bytes().fold(0_u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        let phase = f64::from(seed % 628) / 100.0;
        let swing = 0.02 * beta;
        let end: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 12, 31, 21, 0, 0).single().unwrap_or_default();

        (0..count)
            .map(|i| {
                let t = i as f64;
                let remaining = (count - 1 - i) as i32;
                let wave = (t * 0.35 + phase).sin() * swing + (t * 0.11 + phase).cos() * swing * 0.5;
                let drift = (t - count as f64) * 0.0004;
                let close = price * (1.0 + wave + drift);
                let open = close * (1.0 - swing * 0.1);
                PriceBar::new(
                    end - step * remaining,
                    open,
                    close.max(open) * 1.005,
                    close.min(open) * 0.995,
                    close,
                    1_000_000.0 * (1.0 + 0.3 * (t * 0.7 + phase).cos()),
                )
            })
            .collect()
    }
}

#[async_trait]
impl MarketDataClient for MockMarketData {
    async fn fetch_history(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        let symbol = ticker.to_uppercase();
        self.simulate(&symbol).await?;

        let (price, _, beta) = Self::quote(&symbol)
            .ok_or_else(|| AdvisorError::NotFound(format!("ticker {}", symbol)))?;

        let days = period.trading_days();
        let (count, step) = match interval {
            Interval::OneHour => (days * 7, ChronoDuration::hours(1)),
            Interval::OneDay => (days, ChronoDuration::days(1)),
            Interval::OneWeek => (days.div_ceil(5), ChronoDuration::weeks(1)),
        };

        Ok(Self::synthetic_bars(&symbol, price, beta, count, step))
    }

    async fn fetch_metadata(&self, ticker: &str) -> Result<TickerMetadata> {
        let symbol = ticker.to_uppercase();
        self.simulate(&symbol).await?;

        let (price, name, beta) = Self::quote(&symbol)
            .ok_or_else(|| AdvisorError::NotFound(format!("ticker {}", symbol)))?;

        let last_price = if self.missing_price.contains(&symbol) {
            None
        } else {
            Some(price)
        };

        Ok(TickerMetadata {
            last_price,
            beta: Some(beta),
            short_name: Some(name.to_string()),
        })
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}

/// Mock news provider returning a fixed article set
#[derive(Default)]
pub struct MockNewsClient {
    articles: Vec<NewsArticle>,
    failing: bool,
}

impl MockNewsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(articles: Vec<NewsArticle>) -> Self {
        Self { articles, failing: false }
    }

    /// Every fetch fails as an upstream outage
    pub fn failing() -> Self {
        Self { articles: Vec::new(), failing: true }
    }

    /// Build a simple article stamped `minutes_ago` before a fixed instant
    pub fn article(title: &str, summary: &str, minutes_ago: i64) -> NewsArticle {
        let anchor = Utc.with_ymd_and_hms(2024, 12, 31, 21, 0, 0).single().unwrap_or_default();
        NewsArticle {
            title: title.to_string(),
            summary: summary.to_string(),
            published_at: Some(anchor - ChronoDuration::minutes(minutes_ago)),
            source: "MockWire".to_string(),
            url: format!("https://news.example.com/{}", minutes_ago),
        }
    }
}

#[async_trait]
impl NewsClient for MockNewsClient {
    async fn fetch_recent(&self, ticker: &str) -> Result<Vec<NewsArticle>> {
        if self.failing {
            return Err(AdvisorError::upstream("MockNews", format!("no feed for {}", ticker)));
        }
        Ok(self.articles.clone())
    }

    fn name(&self) -> &str {
        "MockNews"
    }
}
