//! Application State

use std::sync::Arc;
use std::time::Duration;

use advisor_runtime::OllamaSentiment;
use stock_advisor::market::{
    MergedNewsClient, MockMarketData, MockNewsClient, NewsApiClient, YahooFinanceClient,
    YahooNewsClient,
};
use stock_advisor::{
    AdvisorConfig, ClassifierHandle, MarketDataClient, NewsClient, PredictionEngine, Result,
    RiskProfiler, SentimentAggregator, SentimentScorer,
};

use crate::config::{MarketSource, ServerConfig};
use crate::users::MemoryUserStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Risk scoring and suggestions
    pub profiler: Arc<RiskProfiler>,

    /// Indicator + sentiment + classifier pipeline
    pub engine: Arc<PredictionEngine>,

    /// News sentiment (shared with the engine)
    pub sentiment: Arc<SentimentAggregator>,

    /// Lazily loaded classifier (shared with the engine)
    pub classifier: Arc<ClassifierHandle>,

    /// Ollama backend, if sentiment is LLM-backed
    pub ollama: Option<Arc<OllamaSentiment>>,

    /// Registered users
    pub users: Arc<MemoryUserStore>,
}

impl AppState {
    /// Wire the pipelines from explicit collaborators
    pub fn new(
        market: Arc<dyn MarketDataClient>,
        news: Arc<dyn NewsClient>,
        scorer: Arc<dyn SentimentScorer>,
        classifier: Arc<ClassifierHandle>,
        config: &AdvisorConfig,
    ) -> Self {
        let sentiment = Arc::new(SentimentAggregator::new(news, scorer, config));
        let engine = Arc::new(PredictionEngine::new(
            market.clone(),
            sentiment.clone(),
            classifier.clone(),
            config.market_timeout,
        ));

        Self {
            profiler: Arc::new(RiskProfiler::new(market, config)),
            engine,
            sentiment,
            classifier,
            ollama: None,
            users: Arc::new(MemoryUserStore::new()),
        }
    }

    /// Build production state from configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let advisor = &config.advisor;

        let market: Arc<dyn MarketDataClient> = match config.market_source {
            MarketSource::Yahoo => Arc::new(YahooFinanceClient::new(advisor.market_timeout)?),
            MarketSource::Mock => Arc::new(MockMarketData::new()),
        };

        let newsapi = match NewsApiClient::from_env(advisor.news_timeout) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("⚠ NewsAPI disabled: {}", e);
                None
            }
        };
        let news = news_client(config.market_source, &market, newsapi, advisor.news_timeout)?;

        let ollama = Arc::new(OllamaSentiment::from_env());
        let classifier = Arc::new(ClassifierHandle::new(advisor.model_path.clone()));

        let mut state = Self::new(market, news, ollama.clone(), classifier, advisor);
        state.ollama = Some(ollama);
        Ok(state)
    }
}

/// NewsAPI when keyed, plus keyless Yahoo news when market data is live
fn news_client(
    source: MarketSource,
    market: &Arc<dyn MarketDataClient>,
    newsapi: Option<NewsApiClient>,
    timeout: Duration,
) -> Result<Arc<dyn NewsClient>> {
    let mut sources: Vec<Arc<dyn NewsClient>> = Vec::new();
    if let Some(client) = newsapi {
        sources.push(Arc::new(client.with_name_lookup(market.clone())));
    }
    if source == MarketSource::Yahoo {
        sources.push(Arc::new(YahooNewsClient::new(timeout)?));
    }

    if sources.is_empty() {
        tracing::warn!("⚠ No news sources - using the offline feed, news sentiment will be neutral");
        return Ok(Arc::new(MockNewsClient::new()));
    }

    let merged = MergedNewsClient::new(sources);
    tracing::info!("News sources: {}", merged.sources().collect::<Vec<_>>().join(", "));
    Ok(Arc::new(merged))
}
