//! # stock-advisor
//!
//! Per-user stock risk profiling and short-horizon direction prediction.
//!
//! ## Pipelines
//!
//! ```text
//! Risk profile
//! ┌──────────────┐   ┌─────────────────┐   ┌──────────────┐   ┌────────────────────┐
//! │ 1y daily bars│──▶│ annualized vol  │──▶│  RiskScorer  │──▶│ SuggestionSampler  │
//! │ + metadata   │   │ + beta + salary │   │  1..99, tier │   │ 3-5 alternatives   │
//! └──────────────┘   └─────────────────┘   └──────────────┘   └────────────────────┘
//!
//! Prediction
//! ┌──────────────┐   ┌─────────────────┐   ┌──────────────┐   ┌────────────────────┐
//! │ 3mo daily    │──▶│ 14 indicators   │──▶│  classifier  │──▶│ recommend_action   │
//! │ bars         │   │ + news sentiment│   │ [p_dn, p_up] │   │ Strong Buy..Sell   │
//! └──────────────┘   └─────────────────┘   └──────────────┘   └────────────────────┘
//! ```
//!
//! Market data, news and sentiment sit behind traits (`MarketDataClient`,
//! `NewsClient`, `SentimentScorer`) so providers can be swapped or mocked.

pub mod config;
pub mod error;
pub mod indicators;
pub mod market;
pub mod model;
pub mod prediction;
pub mod risk;
pub mod sentiment;
pub mod users;

pub use config::AdvisorConfig;
pub use error::{AdvisorError, ErrorKind, Result};
pub use indicators::{FeatureRow, IndicatorVector};
pub use market::{HistoryPeriod, Interval, MarketDataClient, NewsClient};
pub use model::{
    AnnotatedArticle, Direction, NewsArticle, PredictionReport, PredictionResult, PriceBar,
    Recommendation, RiskAction, RiskLevel, RiskProfile, RiskRecommendation, SentimentLabel,
    SuggestedStock, TickerMetadata,
};
pub use prediction::{ClassifierHandle, PredictionEngine, ProbabilityModel, recommend_action};
pub use risk::profile::PriceHistory;
pub use risk::{RiskProfiler, RiskScorer, SuggestionSampler};
pub use sentiment::{SentimentAggregator, SentimentScorer};
pub use users::{UserDirectory, resolve_salary};
