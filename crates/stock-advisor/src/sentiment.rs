//! Sentiment Aggregator
//!
//! Reduces recent news about a ticker to a single score in [-1, 1]. The
//! scoring collaborator is pluggable; whatever backs it, sentiment never
//! fails a request and degrades to neutral instead.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::config::AdvisorConfig;
use crate::error::Result;
use crate::market::{NewsClient, with_timeout};
use crate::model::{AnnotatedArticle, NewsArticle, SentimentLabel};

/// Hard cap on items fed to the aggregate or returned in a feed
pub const MAX_NEWS_ITEMS: usize = 10;

/// Headlines shorter than this are noise
const MIN_TITLE_CHARS: usize = 5;

/// Text sentiment collaborator
///
/// Implementations return a score in [-1, 1] and degrade to 0.0 on any
/// internal failure.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, text: &str) -> f64;

    fn name(&self) -> &str;
}

/// Scores everything as neutral
#[derive(Debug, Default, Clone, Copy)]
pub struct NeutralSentiment;

#[async_trait]
impl SentimentScorer for NeutralSentiment {
    async fn score(&self, _text: &str) -> f64 {
        0.0
    }

    fn name(&self) -> &str {
        "neutral"
    }
}

/// Returns the same score for every text
#[derive(Debug, Clone, Copy)]
pub struct FixedSentiment(pub f64);

#[async_trait]
impl SentimentScorer for FixedSentiment {
    async fn score(&self, _text: &str) -> f64 {
        self.0
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Arithmetic mean clamped to [-1, 1]; empty input is neutral
pub fn aggregate(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    if mean.is_finite() { mean.clamp(-1.0, 1.0) } else { 0.0 }
}

/// News fetch plus sentiment scoring for one ticker
pub struct SentimentAggregator {
    news: Arc<dyn NewsClient>,
    scorer: Arc<dyn SentimentScorer>,
    news_timeout: Duration,
    score_timeout: Duration,
    limit: usize,
    concurrency: usize,
}

impl SentimentAggregator {
    pub fn new(
        news: Arc<dyn NewsClient>,
        scorer: Arc<dyn SentimentScorer>,
        config: &AdvisorConfig,
    ) -> Self {
        Self {
            news,
            scorer,
            news_timeout: config.news_timeout,
            score_timeout: config.sentiment_timeout,
            limit: config.news_limit.clamp(1, MAX_NEWS_ITEMS),
            concurrency: config.sentiment_concurrency.max(1),
        }
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Mean sentiment of the most recent news; 0.0 when nothing is available.
    pub async fn news_sentiment(&self, ticker: &str) -> f64 {
        let mut articles = match self.fetch(ticker).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!("News unavailable for {}, using neutral sentiment: {}", ticker, e);
                return 0.0;
            }
        };

        // newest first, undated items last
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        let texts: Vec<String> = articles
            .iter()
            .take(self.limit)
            .map(NewsArticle::sentiment_text)
            .collect();

        let scores: Vec<f64> = stream::iter(texts)
            .map(|text| self.score_text(text))
            .buffered(self.concurrency)
            .collect()
            .await;

        let score = aggregate(&scores);
        debug!("Sentiment for {} over {} items: {:.3}", ticker, scores.len(), score);
        score
    }

    /// Labeled news feed for a ticker; provider failures propagate.
    pub async fn news_feed(&self, ticker: &str) -> Result<Vec<AnnotatedArticle>> {
        let articles = self.fetch(ticker).await?;
        Ok(self.annotate(articles).await)
    }

    /// Dedupe by title, drop stub headlines, keep the first `limit` and label them.
    pub async fn annotate(&self, articles: Vec<NewsArticle>) -> Vec<AnnotatedArticle> {
        let mut seen = HashSet::new();
        let kept: Vec<NewsArticle> = articles
            .into_iter()
            .filter(|a| a.title.trim().chars().count() >= MIN_TITLE_CHARS)
            .filter(|a| seen.insert(a.title.trim().to_lowercase()))
            .take(self.limit)
            .collect();

        stream::iter(kept)
            .map(|article| async move {
                let sentiment = self.label_text(&article.sentiment_text()).await;
                AnnotatedArticle {
                    headline: article.title,
                    summary: article.summary,
                    source: article.source,
                    link: article.url,
                    sentiment,
                    timestamp: article.published_at,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Label arbitrary text; blank text is neutral without a collaborator call.
    pub async fn label_text(&self, text: &str) -> SentimentLabel {
        if text.trim().is_empty() {
            return SentimentLabel::Neutral;
        }
        SentimentLabel::from_score(self.score_text(text.to_string()).await)
    }

    async fn fetch(&self, ticker: &str) -> Result<Vec<NewsArticle>> {
        with_timeout(self.news.name(), self.news_timeout, self.news.fetch_recent(ticker)).await
    }

    async fn score_text(&self, text: String) -> f64 {
        match tokio::time::timeout(self.score_timeout, self.scorer.score(&text)).await {
            Ok(score) if score.is_finite() => score.clamp(-1.0, 1.0),
            Ok(_) => 0.0,
            Err(_) => {
                warn!("{} sentiment timed out after {:?}", self.scorer.name(), self.score_timeout);
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{MergedNewsClient, MockNewsClient};

    /// Scores by keyword so ordering and selection are observable
    struct KeywordSentiment;

    #[async_trait]
    impl SentimentScorer for KeywordSentiment {
        async fn score(&self, text: &str) -> f64 {
            let text = text.to_lowercase();
            if text.contains("surge") {
                1.0
            } else if text.contains("plunge") {
                -1.0
            } else {
                0.0
            }
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    struct SlowSentiment;

    #[async_trait]
    impl SentimentScorer for SlowSentiment {
        async fn score(&self, _text: &str) -> f64 {
            tokio::time::sleep(Duration::from_secs(5)).await;
            1.0
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn aggregator(news: MockNewsClient, scorer: impl SentimentScorer + 'static) -> SentimentAggregator {
        SentimentAggregator::new(Arc::new(news), Arc::new(scorer), &AdvisorConfig::default())
    }

    #[test]
    fn test_aggregate() {
        assert_eq!(aggregate(&[]), 0.0);
        assert!((aggregate(&[1.0, 0.0, -0.5]) - 0.5 / 3.0).abs() < 1e-12);
        assert_eq!(aggregate(&[f64::NAN]), 0.0);
    }

    #[tokio::test]
    async fn test_news_failure_is_neutral() {
        let agg = aggregator(MockNewsClient::failing(), FixedSentiment(0.9));
        assert_eq!(agg.news_sentiment("AAPL").await, 0.0);
        assert!(agg.news_feed("AAPL").await.is_err());
    }

    #[tokio::test]
    async fn test_merged_feed_survives_failing_source() {
        let news = MergedNewsClient::new(vec![
            Arc::new(MockNewsClient::failing()),
            Arc::new(MockNewsClient::with_articles(vec![MockNewsClient::article(
                "Apple shares surge on record iPhone sales",
                "",
                5,
            )])),
        ]);
        let agg = SentimentAggregator::new(
            Arc::new(news),
            Arc::new(FixedSentiment(1.0)),
            &AdvisorConfig::default(),
        );

        assert_eq!(agg.news_sentiment("AAPL").await, 1.0);
        assert_eq!(agg.news_feed("AAPL").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_news_is_neutral() {
        let agg = aggregator(MockNewsClient::new(), FixedSentiment(0.9));
        assert_eq!(agg.news_sentiment("AAPL").await, 0.0);
    }

    #[tokio::test]
    async fn test_most_recent_items_only() {
        // 10 fresh neutral items, then 5 older positive ones that must be ignored
        let mut articles: Vec<NewsArticle> = (0..10)
            .map(|i| MockNewsClient::article(&format!("Quarterly update {}", i), "flat", i))
            .collect();
        articles.extend(
            (0..5).map(|i| MockNewsClient::article(&format!("Shares surge {}", i), "", 600 + i)),
        );
        articles.reverse();

        let agg = aggregator(MockNewsClient::with_articles(articles), KeywordSentiment);
        assert_eq!(agg.news_sentiment("AAPL").await, 0.0);
    }

    #[tokio::test]
    async fn test_mean_of_scores() {
        let articles = vec![
            MockNewsClient::article("Shares surge on earnings", "", 1),
            MockNewsClient::article("Stock plunge after guidance", "", 2),
            MockNewsClient::article("Shares surge again", "", 3),
            MockNewsClient::article("Annual meeting scheduled", "", 4),
        ];
        let agg = aggregator(MockNewsClient::with_articles(articles), KeywordSentiment);
        assert!((agg.news_sentiment("AAPL").await - 0.25).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_scorer_timeout_degrades() {
        let config = AdvisorConfig {
            sentiment_timeout: Duration::from_millis(10),
            ..AdvisorConfig::default()
        };
        let news = MockNewsClient::with_articles(vec![MockNewsClient::article("Shares surge", "", 1)]);
        let agg = SentimentAggregator::new(Arc::new(news), Arc::new(SlowSentiment), &config);
        assert_eq!(agg.news_sentiment("AAPL").await, 0.0);
    }

    #[tokio::test]
    async fn test_annotate_dedupes_and_filters() {
        let mut articles = vec![
            MockNewsClient::article("Shares surge on earnings", "", 1),
            MockNewsClient::article("SHARES SURGE ON EARNINGS", "", 2),
            MockNewsClient::article("Up", "", 3),
            MockNewsClient::article("Stock plunge after guidance", "", 4),
        ];
        articles.extend((0..20).map(|i| MockNewsClient::article(&format!("Market wrap {}", i), "", 10 + i)));

        let agg = aggregator(MockNewsClient::new(), KeywordSentiment);
        let feed = agg.annotate(articles).await;

        assert_eq!(feed.len(), MAX_NEWS_ITEMS);
        assert_eq!(feed[0].sentiment, SentimentLabel::Positive);
        assert_eq!(feed[1].headline, "Stock plunge after guidance");
        assert_eq!(feed[1].sentiment, SentimentLabel::Negative);
        assert_eq!(feed[2].sentiment, SentimentLabel::Neutral);
    }

    #[tokio::test]
    async fn test_label_blank_text() {
        let agg = aggregator(MockNewsClient::new(), FixedSentiment(1.0));
        assert_eq!(agg.label_text("   ").await, SentimentLabel::Neutral);
        assert_eq!(agg.label_text("great quarter").await, SentimentLabel::Positive);
    }
}
