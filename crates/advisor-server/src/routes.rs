//! Router

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    analyze_sentiment, create_user, get_user, health_check, history, news, predict, risk_profile,
    risk_recommendation,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))
        // Stocks
        .route("/api/stock/risk/{ticker}", get(risk_profile))
        .route("/api/stock/recommendation/{ticker}", get(risk_recommendation))
        .route("/api/stock/predict/{ticker}", get(predict))
        .route("/api/stock/history/{ticker}", get(history))
        .route("/api/stock/news/{ticker}", get(news))
        // Sentiment
        .route("/api/sentiment/analyze", get(analyze_sentiment))
        // Users
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", get(get_user))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use stock_advisor::market::{MockMarketData, MockNewsClient};
    use stock_advisor::sentiment::FixedSentiment;
    use stock_advisor::{AdvisorConfig, ClassifierHandle, ProbabilityModel, Result};
    use tower::ServiceExt;

    use super::*;

    struct ConstantModel;

    impl ProbabilityModel for ConstantModel {
        fn predict_proba(&self, _features: &stock_advisor::prediction::FeatureVector) -> Result<[f64; 2]> {
            Ok([0.2, 0.8])
        }
    }

    fn state_with(classifier: ClassifierHandle, news: MockNewsClient) -> AppState {
        AppState::new(
            Arc::new(MockMarketData::new()),
            Arc::new(news),
            Arc::new(FixedSentiment(0.5)),
            Arc::new(classifier),
            &AdvisorConfig::default(),
        )
    }

    fn test_state() -> AppState {
        let news = MockNewsClient::with_articles(vec![
            MockNewsClient::article("Record deliveries this quarter", "", 10),
            MockNewsClient::article("Record deliveries this quarter", "", 20),
        ]);
        state_with(ClassifierHandle::with_model(Arc::new(ConstantModel)), news)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(router(test_state()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_loaded"], true);
        assert_eq!(body["sentiment_backend"], "fixed");
    }

    #[tokio::test]
    async fn test_risk_profile() {
        let (status, body) = get_json(router(test_state()), "/api/stock/risk/aapl?salary=95000").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticker"], "AAPL");
        let suggestions = body["suggested_stocks"].as_array().unwrap();
        assert!((3..=5).contains(&suggestions.len()));
        assert!(suggestions.iter().all(|s| s["ticker"] != "AAPL"));
        let score = body["risk_score"].as_f64().unwrap();
        assert!((1.0..=99.0).contains(&score));
    }

    #[tokio::test]
    async fn test_risk_requires_salary() {
        let (status, body) = get_json(router(test_state()), "/api/stock/risk/AAPL").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");

        let (status, _) = get_json(router(test_state()), "/api/stock/risk/AAPL?salary=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(router(test_state()), "/api/stock/risk/AAPL?salary=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_ticker() {
        let (status, body) = get_json(router(test_state()), "/api/stock/risk/ZZZZ?salary=50000").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_recommendation() {
        let (status, body) =
            get_json(router(test_state()), "/api/stock/recommendation/KO?salary=250000").await;
        assert_eq!(status, StatusCode::OK);
        let action = body["recommendation"].as_str().unwrap();
        assert!(["BUY", "HOLD", "SELL"].contains(&action));
    }

    #[tokio::test]
    async fn test_predict() {
        let (status, body) = get_json(router(test_state()), "/api/stock/predict/MSFT").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "MSFT");
        assert_eq!(body["prediction"]["direction"], "Bullish");
        assert_eq!(body["sentiment_analysis"]["sentiment_label"], "Positive");
    }

    #[tokio::test]
    async fn test_predict_without_model() {
        let state = state_with(ClassifierHandle::new("/nonexistent/model.json"), MockNewsClient::new());
        let app = router(state);

        for _ in 0..2 {
            let (status, body) = get_json(app.clone(), "/api/stock/predict/MSFT").await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body["code"], "MODEL_UNAVAILABLE");
        }
    }

    #[tokio::test]
    async fn test_history() {
        let (status, body) =
            get_json(router(test_state()), "/api/stock/history/NVDA?period=3mo&interval=1d").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bars"].as_array().unwrap().len(), 63);

        let (status, _) = get_json(router(test_state()), "/api/stock/history/NVDA?period=20y").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_news_feed() {
        let (status, body) = get_json(router(test_state()), "/api/stock/news/tsla").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticker"], "TSLA");
        let articles = body["articles"].as_array().unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0]["sentiment"], "Positive");
    }

    #[tokio::test]
    async fn test_news_upstream_failure() {
        let state = state_with(
            ClassifierHandle::with_model(Arc::new(ConstantModel)),
            MockNewsClient::failing(),
        );
        let (status, body) = get_json(router(state), "/api/stock/news/TSLA").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "UPSTREAM_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_analyze_sentiment() {
        let (status, body) =
            get_json(router(test_state()), "/api/sentiment/analyze?text=great%20quarter").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sentiment"], "Positive");

        let (_, body) = get_json(router(test_state()), "/api/sentiment/analyze?text=").await;
        assert_eq!(body["sentiment"], "Neutral");
    }

    #[tokio::test]
    async fn test_user_salary_lookup() {
        let app = router(test_state());

        let request = Request::post("/api/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"email": "sam@example.com", "name": "Sam", "salary": 64000}).to_string(),
            ))
            .unwrap();
        let (status, user) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = user["id"].as_str().unwrap().to_string();

        let (status, body) = get_json(app.clone(), &format!("/api/users/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "sam@example.com");

        let (status, body) = get_json(app.clone(), &format!("/api/stock/risk/PG?user_id={}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_salary"], "64000");

        let (status, _) = get_json(app, "/api/stock/risk/PG?user_id=nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
