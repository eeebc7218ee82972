//! # advisor-runtime
//!
//! Runtime integrations for the stock-advisor system.
//!
//! ## Sentiment backends
//!
//! - **Ollama** (default): local LLM labels each text Positive, Negative or Neutral
//! - **Neutral**: always 0.0, used when no backend is configured
//!
//! ## Usage
//!
//! ```rust,ignore
//! use advisor_runtime::OllamaSentiment;
//!
//! let scorer = Arc::new(OllamaSentiment::from_env());
//! let aggregator = SentimentAggregator::new(news, scorer, &config);
//! ```

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaSentiment};

// Re-export core types for convenience
pub use stock_advisor::sentiment::{NeutralSentiment, SentimentScorer};
