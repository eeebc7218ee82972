//! Yahoo Finance client
//!
//! History and quote metadata come from the unofficial chart API; beta comes
//! from quoteSummary on a best-effort basis. quoteSummary needs a session
//! cookie plus a crumb, fetched once and refreshed when Yahoo rejects it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{HistoryPeriod, Interval, MarketDataClient};
use crate::error::{AdvisorError, Result};
use crate::model::{PriceBar, TickerMetadata, normalize_bars};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    short_name: Option<String>,
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: Summary,
}

#[derive(Debug, Deserialize)]
struct Summary {
    result: Option<Vec<SummaryResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    default_key_statistics: Option<KeyStatistics>,
}

#[derive(Debug, Deserialize)]
struct KeyStatistics {
    beta: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

/// Yahoo uses hyphens instead of dots for share classes (BRK-B, not BRK.B)
fn yahoo_symbol(symbol: &str) -> String {
    symbol.to_uppercase().replace('.', "-")
}

fn parse_beta(data: SummaryResponse) -> Option<f64> {
    data.quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .and_then(|r| r.default_key_statistics)
        .and_then(|s| s.beta)
        .and_then(|b| b.raw)
        .filter(|b| b.is_finite())
}

/// A crumb is a short opaque token; anything else is an error page
fn valid_crumb(body: &str) -> Option<String> {
    let crumb = body.trim();
    let plausible = !crumb.is_empty() && crumb.len() <= 64 && !crumb.contains(['<', ' ', '{']);
    plausible.then(|| crumb.to_string())
}

/// Yahoo Finance market-data client
pub struct YahooFinanceClient {
    client: Client,
    crumb: Mutex<Option<String>>,
}

impl YahooFinanceClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            crumb: Mutex::new(None),
        })
    }

    async fn crumb(&self) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // fc.yahoo.com answers 404 but still sets the session cookie
        if let Err(e) = self.client.get(COOKIE_URL).send().await {
            debug!("Yahoo session cookie request failed: {}", e);
        }

        let response = self.client.get(CRUMB_URL).send().await?;
        if !response.status().is_success() {
            return Err(AdvisorError::upstream("Yahoo Finance", format!("crumb HTTP {}", response.status())));
        }

        let body = response.text().await?;
        let crumb = valid_crumb(&body)
            .ok_or_else(|| AdvisorError::upstream("Yahoo Finance", "unusable crumb"))?;
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn chart(&self, ticker: &str, range: &str, interval: &str) -> Result<ChartResult> {
        let url = format!(
            "{}/{}?range={}&interval={}&includePrePost=false",
            CHART_URL,
            yahoo_symbol(ticker),
            range,
            interval
        );
        debug!("Fetching Yahoo chart: {}", url);

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AdvisorError::NotFound(format!("ticker {}", ticker)));
        }
        if !response.status().is_success() {
            return Err(AdvisorError::upstream("Yahoo Finance", format!("HTTP {}", response.status())));
        }

        let data: ChartResponse = response.json().await?;
        parse_chart(ticker, data)
    }

    async fn fetch_beta(&self, ticker: &str) -> Result<Option<f64>> {
        let crumb = self.crumb().await?;
        let url = format!(
            "{}/{}?modules=defaultKeyStatistics",
            SUMMARY_URL,
            yahoo_symbol(ticker)
        );

        let response = self
            .client
            .get(&url)
            .query(&[("crumb", crumb.as_str())])
            .send()
            .await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            *self.crumb.lock().await = None;
        }
        if !status.is_success() {
            return Err(AdvisorError::upstream("Yahoo Finance", format!("quoteSummary HTTP {}", status)));
        }

        let data: SummaryResponse = response.json().await?;
        Ok(parse_beta(data))
    }
}

fn parse_chart(ticker: &str, data: ChartResponse) -> Result<ChartResult> {
    if let Some(error) = data.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Err(AdvisorError::NotFound(format!("ticker {}", ticker)));
        }
        return Err(AdvisorError::upstream(
            "Yahoo Finance",
            format!("{} - {}", error.code, error.description),
        ));
    }

    data.chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AdvisorError::NotFound(format!("no chart data for {}", ticker)))
}

fn chart_bars(result: ChartResult) -> Vec<PriceBar> {
    let timestamps = result.timestamp.unwrap_or_default();
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Vec::new();
    };

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();
    let at = |series: &Vec<Option<f64>>, i: usize| series.get(i).copied().flatten();

    let bars = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = at(&closes, i)?;
            let timestamp = Utc.timestamp_opt(ts, 0).single()?;
            Some(PriceBar::new(
                timestamp,
                at(&opens, i).unwrap_or(close),
                at(&highs, i).unwrap_or(close),
                at(&lows, i).unwrap_or(close),
                close,
                at(&volumes, i).unwrap_or(0.0),
            ))
        })
        .collect();

    normalize_bars(bars)
}

#[async_trait]
impl MarketDataClient for YahooFinanceClient {
    async fn fetch_history(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        let result = self.chart(ticker, period.as_str(), interval.as_str()).await?;
        let bars = chart_bars(result);

        if bars.is_empty() {
            return Err(AdvisorError::NotFound(format!(
                "no {} history for {}",
                period.as_str(),
                ticker
            )));
        }
        Ok(bars)
    }

    async fn fetch_metadata(&self, ticker: &str) -> Result<TickerMetadata> {
        let result = self.chart(ticker, "1d", "1d").await?;
        let meta = result.meta;

        let beta = match self.fetch_beta(ticker).await {
            Ok(Some(beta)) => Some(beta),
            Ok(None) => {
                warn!("Yahoo has no beta for {}, scoring with market beta", ticker);
                None
            }
            Err(e) => {
                warn!("Beta lookup failed for {}, scoring with market beta: {}", ticker, e);
                None
            }
        };

        Ok(TickerMetadata {
            last_price: meta.regular_market_price.filter(|p| p.is_finite() && *p > 0.0),
            beta,
            short_name: meta.short_name.or(meta.long_name),
        })
    }

    fn name(&self) -> &str {
        "Yahoo Finance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yahoo_symbol() {
        assert_eq!(yahoo_symbol("brk.b"), "BRK-B");
        assert_eq!(yahoo_symbol("AAPL"), "AAPL");
    }

    #[test]
    fn test_chart_parsing_skips_null_closes() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"regularMarketPrice": 155.0, "shortName": "Apple Inc."},
                    "timestamp": [1700006400, 1699920000, 1700092800],
                    "indicators": {"quote": [{
                        "open": [150.0, 149.0, null],
                        "high": [155.0, 151.0, null],
                        "low": [148.0, 147.0, null],
                        "close": [153.0, 150.0, null],
                        "volume": [50000000, 40000000, null]
                    }]}
                }],
                "error": null
            }
        }"#;
        let data: ChartResponse = serde_json::from_str(json).unwrap();
        let result = parse_chart("AAPL", data).unwrap();
        assert_eq!(result.meta.short_name.as_deref(), Some("Apple Inc."));

        let bars = chart_bars(result);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 150.0);
        assert_eq!(bars[1].volume, 50_000_000.0);
    }

    #[test]
    fn test_chart_error_not_found() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let data: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(parse_chart("ZZZZ", data), Err(AdvisorError::NotFound(_))));
    }

    #[test]
    fn test_summary_beta() {
        let json = r#"{"quoteSummary": {"result": [{"defaultKeyStatistics": {"beta": {"raw": 1.24, "fmt": "1.24"}}}]}}"#;
        let data: SummaryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parse_beta(data), Some(1.24));

        let json = r#"{"quoteSummary": {"result": [{"defaultKeyStatistics": {"beta": {}}}]}}"#;
        let data: SummaryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parse_beta(data), None);
    }

    #[test]
    fn test_valid_crumb() {
        assert_eq!(valid_crumb("aB3.xYz/9Q\n").as_deref(), Some("aB3.xYz/9Q"));
        assert_eq!(valid_crumb("  "), None);
        assert_eq!(valid_crumb("<html><body>Too Many Requests</body></html>"), None);
        assert_eq!(valid_crumb(r#"{"finance":{"error":"Unauthorized"}}"#), None);
    }
}
