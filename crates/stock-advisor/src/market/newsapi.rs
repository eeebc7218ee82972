//! NewsAPI.org client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{MarketDataClient, NewsClient};
use crate::error::{AdvisorError, Result};
use crate::model::NewsArticle;

const EVERYTHING_URL: &str = "https://newsapi.org/v2/everything";
const PAGE_SIZE: u32 = 20;
const LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<RawSource>,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl From<RawArticle> for NewsArticle {
    fn from(raw: RawArticle) -> Self {
        NewsArticle {
            title: raw.title.unwrap_or_default().trim().to_string(),
            summary: raw.description.unwrap_or_default(),
            published_at: raw.published_at,
            source: raw
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".into()),
            url: raw.url.unwrap_or_default(),
        }
    }
}

/// Search terms: the ticker, widened with the company name when known
fn search_query(ticker: &str, short_name: Option<&str>) -> String {
    match short_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("{} OR {}", ticker, name),
        None => ticker.to_string(),
    }
}

/// NewsAPI `everything` search over the last week
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    names: Option<Arc<dyn MarketDataClient>>,
}

impl NewsApiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            names: None,
        })
    }

    /// Resolve company names through `market` so searches also match them
    pub fn with_name_lookup(mut self, market: Arc<dyn MarketDataClient>) -> Self {
        self.names = Some(market);
        self
    }

    async fn short_name(&self, ticker: &str) -> Option<String> {
        let market = self.names.as_ref()?;
        match market.fetch_metadata(ticker).await {
            Ok(meta) => meta.short_name,
            Err(e) => {
                debug!("No company name for {}: {}", ticker, e);
                None
            }
        }
    }

    /// Create from `NEWSAPI_KEY`
    pub fn from_env(timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("NEWSAPI_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AdvisorError::Config("NEWSAPI_KEY is not set".into()))?;
        Self::new(api_key, timeout)
    }
}

#[async_trait]
impl NewsClient for NewsApiClient {
    async fn fetch_recent(&self, ticker: &str) -> Result<Vec<NewsArticle>> {
        let to = Utc::now();
        let from = to - ChronoDuration::days(LOOKBACK_DAYS);
        let page_size = PAGE_SIZE.to_string();
        let from_date = from.format("%Y-%m-%d").to_string();
        let to_date = to.format("%Y-%m-%d").to_string();
        let query = search_query(ticker, self.short_name(ticker).await.as_deref());

        debug!("Fetching NewsAPI articles for '{}'", query);

        let response = self
            .client
            .get(EVERYTHING_URL)
            .query(&[
                ("q", query.as_str()),
                ("apiKey", self.api_key.as_str()),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
                ("from", from_date.as_str()),
                ("to", to_date.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdvisorError::upstream("NewsAPI", format!("HTTP {}", response.status())));
        }

        let data: EverythingResponse = response.json().await?;
        Ok(data.articles.into_iter().map(NewsArticle::from).collect())
    }

    fn name(&self) -> &str {
        "NewsAPI"
    }
}
