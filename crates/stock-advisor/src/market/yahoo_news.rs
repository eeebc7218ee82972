//! Yahoo Finance news (no API key)

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::NewsClient;
use crate::error::{AdvisorError, Result};
use crate::model::NewsArticle;

const SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";
const NEWS_COUNT: u32 = 20;
const MIN_TITLE_CHARS: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<RawStory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStory {
    title: Option<String>,
    summary: Option<String>,
    publisher: Option<String>,
    link: Option<String>,
    provider_publish_time: Option<i64>,
}

impl RawStory {
    fn into_article(self) -> Option<NewsArticle> {
        let title = self.title?.trim().to_string();
        if title.chars().count() < MIN_TITLE_CHARS {
            return None;
        }

        Some(NewsArticle {
            title,
            summary: self.summary.unwrap_or_default(),
            published_at: self
                .provider_publish_time
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
            source: self
                .publisher
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| "Unknown".into()),
            url: self.link.unwrap_or_default(),
        })
    }
}

fn parse_search(data: SearchResponse) -> Vec<NewsArticle> {
    data.news.into_iter().filter_map(RawStory::into_article).collect()
}

/// Ticker headlines from the Yahoo Finance search endpoint
pub struct YahooNewsClient {
    client: Client,
}

impl YahooNewsClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl NewsClient for YahooNewsClient {
    async fn fetch_recent(&self, ticker: &str) -> Result<Vec<NewsArticle>> {
        let news_count = NEWS_COUNT.to_string();
        debug!("Fetching Yahoo news for {}", ticker);

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("q", ticker),
                ("newsCount", news_count.as_str()),
                ("quotesCount", "0"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdvisorError::upstream("Yahoo News", format!("HTTP {}", response.status())));
        }

        let data: SearchResponse = response.json().await?;
        Ok(parse_search(data))
    }

    fn name(&self) -> &str {
        "Yahoo News"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_parsing() {
        let json = r#"{
            "quotes": [],
            "news": [{
                "uuid": "a1",
                "title": " Apple unveils new chip lineup ",
                "publisher": "Bloomberg",
                "link": "https://finance.yahoo.com/news/a1",
                "providerPublishTime": 1714680000,
                "type": "STORY"
            }, {
                "uuid": "a2",
                "title": "Up",
                "publisher": "Reuters",
                "link": "https://finance.yahoo.com/news/a2",
                "providerPublishTime": 1714670000
            }, {
                "uuid": "a3",
                "title": "Analysts weigh services growth",
                "publisher": "",
                "providerPublishTime": null
            }]
        }"#;
        let data: SearchResponse = serde_json::from_str(json).unwrap();
        let articles = parse_search(data);

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Apple unveils new chip lineup");
        assert_eq!(articles[0].source, "Bloomberg");
        assert_eq!(articles[0].published_at.unwrap().timestamp(), 1_714_680_000);
        assert_eq!(articles[1].source, "Unknown");
        assert!(articles[1].published_at.is_none());
    }

    #[test]
    fn test_missing_news_field() {
        let data: SearchResponse = serde_json::from_str(r#"{"quotes": []}"#).unwrap();
        assert!(parse_search(data).is_empty());
    }
}
