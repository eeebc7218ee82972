//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stock_advisor::market::normalize_ticker;
use stock_advisor::{
    AnnotatedArticle, HistoryPeriod, Interval, PredictionReport, PriceHistory, RiskProfile,
    RiskRecommendation, SentimentLabel, resolve_salary,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::users::{NewUser, User};

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model_loaded: bool,
    pub sentiment_backend: String,
    pub sentiment_reachable: bool,
    pub registered_users: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct RiskQuery {
    pub salary: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub period: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub text: String,
    pub sentiment: SentimentLabel,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub ticker: String,
    pub articles: Vec<AnnotatedArticle>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_loaded = state.classifier.get().await.is_ok();
    let sentiment_reachable = match &state.ollama {
        Some(ollama) => ollama.health_check().await,
        None => true,
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model_loaded,
        sentiment_backend: state.sentiment.scorer_name().to_string(),
        sentiment_reachable,
        registered_users: state.users.len(),
    })
}

fn parse_salary(raw: Option<&str>) -> ApiResult<Option<Decimal>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<Decimal>()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("salary '{}' is not a number", raw)))
}

async fn build_profile(state: &AppState, ticker: &str, query: &RiskQuery) -> ApiResult<RiskProfile> {
    let salary = parse_salary(query.salary.as_deref())?;
    let salary = resolve_salary(state.users.as_ref(), salary, query.user_id.as_deref())?;

    let mut rng = StdRng::from_entropy();
    Ok(state.profiler.profile(ticker, salary, &mut rng).await?)
}

/// Per-user risk profile with alternative suggestions
pub async fn risk_profile(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<RiskQuery>,
) -> ApiResult<Json<RiskProfile>> {
    build_profile(&state, &ticker, &query).await.map(Json)
}

/// Risk-tier stance (BUY / HOLD / SELL)
pub async fn risk_recommendation(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<RiskQuery>,
) -> ApiResult<Json<RiskRecommendation>> {
    let profile = build_profile(&state, &ticker, &query).await?;
    Ok(Json(RiskRecommendation::from(&profile)))
}

/// Direction prediction
pub async fn predict(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<Json<PredictionReport>> {
    Ok(Json(state.engine.predict(&ticker).await?))
}

/// Price history with volatility and beta
pub async fn history(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<PriceHistory>> {
    let period: HistoryPeriod = query.period.as_deref().unwrap_or("1mo").parse()?;
    let interval: Interval = query.interval.as_deref().unwrap_or("1d").parse()?;

    Ok(Json(state.profiler.history(&ticker, period, interval).await?))
}

/// Labeled recent news
pub async fn news(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<Json<NewsResponse>> {
    let ticker = normalize_ticker(&ticker)?;
    let articles = state.sentiment.news_feed(&ticker).await?;
    Ok(Json(NewsResponse { ticker, articles }))
}

/// Sentiment label for free text
pub async fn analyze_sentiment(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
) -> Json<AnalyzeResponse> {
    let sentiment = state.sentiment.label_text(&query.text).await;
    Json(AnalyzeResponse {
        text: query.text,
        sentiment,
    })
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.users.register(payload)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<User>> {
    state
        .users
        .get(&id)?
        .map(Json)
        .ok_or_else(|| stock_advisor::AdvisorError::NotFound(format!("user {}", id)).into())
}
