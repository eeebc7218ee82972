//! Advisor Configuration

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Tunables for the risk and prediction pipelines
#[derive(Clone, Debug)]
pub struct AdvisorConfig {
    /// Path of the serialized classifier bundle
    pub model_path: PathBuf,

    /// Income at or above which the salary factor reaches zero
    pub salary_benchmark: Decimal,

    /// Timeout applied to each market-data fetch
    pub market_timeout: Duration,

    /// Timeout applied to each news fetch
    pub news_timeout: Duration,

    /// Timeout applied to each sentiment inference
    pub sentiment_timeout: Duration,

    /// Most recent news items fed to the sentiment aggregate
    pub news_limit: usize,

    /// Concurrent sentiment inferences per request
    pub sentiment_concurrency: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/stock_predictor.json"),
            salary_benchmark: dec!(300000),
            market_timeout: Duration::from_secs(10),
            news_timeout: Duration::from_secs(8),
            sentiment_timeout: Duration::from_secs(20),
            news_limit: 10,
            sentiment_concurrency: 4,
        }
    }
}

impl AdvisorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let model_path = std::env::var("PREDICTION_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);
        let salary_benchmark = std::env::var("SALARY_BENCHMARK")
            .ok()
            .and_then(|v| v.parse::<Decimal>().ok())
            .filter(|v| *v > Decimal::ZERO)
            .unwrap_or(defaults.salary_benchmark);

        Self {
            model_path,
            salary_benchmark,
            market_timeout: env_secs("MARKET_TIMEOUT_SECS").unwrap_or(defaults.market_timeout),
            news_timeout: env_secs("NEWS_TIMEOUT_SECS").unwrap_or(defaults.news_timeout),
            sentiment_timeout: env_secs("SENTIMENT_TIMEOUT_SECS").unwrap_or(defaults.sentiment_timeout),
            news_limit: env_usize("NEWS_LIMIT").unwrap_or(defaults.news_limit),
            sentiment_concurrency: env_usize("SENTIMENT_CONCURRENCY")
                .unwrap_or(defaults.sentiment_concurrency),
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .map(Duration::from_secs)
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AdvisorConfig::default();
        assert_eq!(config.salary_benchmark, dec!(300000));
        assert_eq!(config.news_limit, 10);
        assert_eq!(config.sentiment_timeout, Duration::from_secs(20));
    }
}
