//! Prediction Engine

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use super::classifier::{ClassifierHandle, feature_vector};
use crate::error::{AdvisorError, Result};
use crate::indicators;
use crate::market::{HistoryPeriod, Interval, MarketDataClient, normalize_ticker, with_timeout};
use crate::model::{
    Direction, PredictionReport, PredictionResult, Recommendation, SentimentAnalysis,
    SentimentLabel, TechnicalSnapshot,
};
use crate::sentiment::SentimentAggregator;

/// Map class probabilities, sentiment and RSI to an action. First match wins.
pub fn recommend_action(p_up: f64, p_down: f64, sentiment: f64, rsi: f64) -> Recommendation {
    let confidence = p_up.max(p_down);
    let bullish = p_up > p_down;

    if bullish && confidence > 0.75 && sentiment > 0.3 && rsi < 70.0 {
        Recommendation::StrongBuy
    } else if bullish && confidence > 0.60 && sentiment > 0.0 {
        Recommendation::Buy
    } else if !bullish && confidence > 0.75 && sentiment < -0.3 && rsi > 30.0 {
        Recommendation::StrongSell
    } else if !bullish && confidence > 0.60 && sentiment < 0.0 {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

impl PredictionResult {
    pub fn from_probabilities(p_down: f64, p_up: f64, sentiment: f64, rsi: f64) -> Self {
        let direction = if p_up > p_down {
            Direction::Bullish
        } else {
            Direction::Bearish
        };

        Self {
            direction,
            confidence: p_up.max(p_down) * 100.0,
            probability_up: p_up * 100.0,
            probability_down: p_down * 100.0,
            expected_return_percent: p_up * 5.0 - p_down * 3.0,
            recommendation: recommend_action(p_up, p_down, sentiment, rsi),
        }
    }
}

pub struct PredictionEngine {
    market: Arc<dyn MarketDataClient>,
    sentiment: Arc<SentimentAggregator>,
    classifier: Arc<ClassifierHandle>,
    fetch_timeout: Duration,
}

impl PredictionEngine {
    pub fn new(
        market: Arc<dyn MarketDataClient>,
        sentiment: Arc<SentimentAggregator>,
        classifier: Arc<ClassifierHandle>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            market,
            sentiment,
            classifier,
            fetch_timeout,
        }
    }

    pub async fn predict(&self, ticker: &str) -> Result<PredictionReport> {
        let symbol = normalize_ticker(ticker)?;
        let model = self.classifier.get().await?;

        let bars = with_timeout(
            self.market.name(),
            self.fetch_timeout,
            self.market
                .fetch_history(&symbol, HistoryPeriod::ThreeMonths, Interval::OneDay),
        )
        .await?;

        let latest = indicators::latest(&bars)?;
        let row = latest.to_features();
        let current_price = bars.last().map(|b| b.close).unwrap_or_default();

        let sentiment = self.sentiment.news_sentiment(&symbol).await;
        let features = feature_vector(&row, sentiment);
        debug!("Features for {}: {:?}", symbol, features);

        let [p_down, p_up] = tokio::task::spawn_blocking(move || model.predict_proba(&features))
            .await
            .map_err(|e| AdvisorError::ModelUnavailable(format!("inference task failed: {}", e)))??;

        let prediction = PredictionResult::from_probabilities(p_down, p_up, sentiment, row.rsi);
        info!(
            "Prediction for {}: {:?} at {:.1}% ({})",
            symbol, prediction.direction, prediction.confidence, prediction.recommendation
        );

        Ok(PredictionReport {
            symbol,
            recommendation: prediction.recommendation,
            prediction,
            sentiment_analysis: SentimentAnalysis {
                news_sentiment_score: sentiment,
                sentiment_label: SentimentLabel::from_score(sentiment),
            },
            technical_indicators: TechnicalSnapshot {
                current_price,
                rsi: row.rsi,
                macd: row.macd,
                volatility: row.volatility * 100.0,
                volume_ratio: row.volume_ratio,
            },
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdvisorConfig;
    use crate::market::{MockMarketData, MockNewsClient};
    use crate::prediction::classifier::tests::logistic_json;
    use crate::prediction::classifier::{Classifier, FEATURE_COUNT, FeatureVector, ProbabilityModel};
    use crate::sentiment::FixedSentiment;

    struct ConstantModel([f64; 2]);

    impl ProbabilityModel for ConstantModel {
        fn predict_proba(&self, _features: &FeatureVector) -> Result<[f64; 2]> {
            Ok(self.0)
        }
    }

    fn engine(market: MockMarketData, handle: ClassifierHandle, sentiment: f64) -> PredictionEngine {
        let config = AdvisorConfig::default();
        let news = MockNewsClient::with_articles(vec![MockNewsClient::article(
            "Company announces results",
            "",
            5,
        )]);
        let aggregator = SentimentAggregator::new(Arc::new(news), Arc::new(FixedSentiment(sentiment)), &config);
        PredictionEngine::new(Arc::new(market), Arc::new(aggregator), Arc::new(handle), config.market_timeout)
    }

    #[test]
    fn test_recommend_action() {
        assert_eq!(recommend_action(0.9, 0.1, 0.5, 40.0), Recommendation::StrongBuy);
        assert_eq!(recommend_action(0.9, 0.1, 0.5, 75.0), Recommendation::Buy);
        assert_eq!(recommend_action(0.65, 0.35, 0.1, 50.0), Recommendation::Buy);
        assert_eq!(recommend_action(0.2, 0.8, -0.5, 50.0), Recommendation::StrongSell);
        // 0.7 confidence is below the strong threshold
        assert_eq!(recommend_action(0.3, 0.7, -0.5, 50.0), Recommendation::Sell);
        assert_eq!(recommend_action(0.2, 0.8, -0.5, 25.0), Recommendation::Sell);
        assert_eq!(recommend_action(0.52, 0.48, 0.05, 60.0), Recommendation::Hold);
        assert_eq!(recommend_action(0.5, 0.5, 0.9, 50.0), Recommendation::Hold);
        assert_eq!(recommend_action(0.9, 0.1, -0.5, 40.0), Recommendation::Hold);
    }

    #[test]
    fn test_prediction_result() {
        let result = PredictionResult::from_probabilities(0.25, 0.75, 0.0, 50.0);
        assert_eq!(result.direction, Direction::Bullish);
        assert!((result.confidence - 75.0).abs() < 1e-9);
        assert!((result.probability_down - 25.0).abs() < 1e-9);
        assert!((result.expected_return_percent - 3.0).abs() < 1e-9);
        assert_eq!(result.recommendation, Recommendation::Hold);

        let tie = PredictionResult::from_probabilities(0.5, 0.5, 0.0, 50.0);
        assert_eq!(tie.direction, Direction::Bearish);
    }

    #[tokio::test]
    async fn test_predict() {
        let handle = ClassifierHandle::with_model(Arc::new(ConstantModel([0.1, 0.9])));
        let report = engine(MockMarketData::new(), handle, 0.6).predict("nvda").await.unwrap();

        assert_eq!(report.symbol, "NVDA");
        assert_eq!(report.prediction.direction, Direction::Bullish);
        assert_eq!(report.sentiment_analysis.sentiment_label, SentimentLabel::Positive);
        assert!((report.sentiment_analysis.news_sentiment_score - 0.6).abs() < 1e-12);
        assert!(report.technical_indicators.current_price > 0.0);
        assert!((0.0..=100.0).contains(&report.technical_indicators.rsi));
        assert_eq!(report.recommendation, report.prediction.recommendation);

        let expected = recommend_action(0.9, 0.1, 0.6, report.technical_indicators.rsi);
        assert_eq!(report.recommendation, expected);
    }

    #[tokio::test]
    async fn test_predict_with_artifact_model() {
        let mut weights = [0.0; FEATURE_COUNT];
        weights[14] = -4.0;
        let classifier = Classifier::from_json(&logistic_json(weights, 0.0)).unwrap();
        let handle = ClassifierHandle::with_model(Arc::new(classifier));

        let report = engine(MockMarketData::new(), handle, -0.5).predict("KO").await.unwrap();
        assert_eq!(report.prediction.direction, Direction::Bullish);
        assert!(report.prediction.probability_up > 80.0);
    }

    #[tokio::test]
    async fn test_missing_model_is_fatal() {
        let handle = ClassifierHandle::new("/nonexistent/stock_predictor.json");
        let engine = engine(MockMarketData::new(), handle, 0.0);

        for _ in 0..2 {
            let err = engine.predict("AAPL").await.unwrap_err();
            assert!(matches!(err, AdvisorError::ModelUnavailable(_)));
        }
    }

    #[tokio::test]
    async fn test_unknown_ticker() {
        let handle = ClassifierHandle::with_model(Arc::new(ConstantModel([0.5, 0.5])));
        let err = engine(MockMarketData::new(), handle, 0.0)
            .predict("ZZZZ")
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let handle = ClassifierHandle::with_model(Arc::new(ConstantModel([0.5, 0.5])));
        let err = engine(MockMarketData::new().with_unavailable(&["AAPL"]), handle, 0.0)
            .predict("AAPL")
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
