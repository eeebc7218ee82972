//! Ollama Sentiment Backend
//!
//! Implementation of `SentimentScorer` that asks a local Ollama model for a
//! one-word label and maps it to +1 / -1 / 0.

use std::time::Duration;

use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};
use stock_advisor::model::SentimentLabel;
use stock_advisor::sentiment::SentimentScorer;
use tracing::{debug, warn};

/// Ollama backend configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Model used for labeling
    pub model: String,

    /// Per-text inference timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            model: "llama3:instruct".into(),
            timeout_secs: 20,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("OLLAMA_HOST").unwrap_or(defaults.host);
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let model = std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model);
        let timeout_secs = std::env::var("SENTIMENT_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .filter(|t| *t > 0)
            .unwrap_or(defaults.timeout_secs);

        Self {
            host,
            port,
            model,
            timeout_secs,
        }
    }
}

/// Build the labeling prompt for one text
pub fn sentiment_prompt(text: &str) -> String {
    format!(
        "Analyze the sentiment of the following financial text.\n\
         Reply with one word only: Positive, Negative, or Neutral.\n\n\
         Text: \"{}\"",
        text.trim()
    )
}

/// Ollama-backed sentiment scorer
pub struct OllamaSentiment {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaSentiment {
    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            client: Ollama::new(&config.host, config.port),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(OllamaConfig::from_env())
    }

    /// Create with default localhost settings
    pub fn localhost() -> Self {
        Self::from_config(OllamaConfig::default())
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Whether the Ollama server answers a model listing within the timeout
    pub async fn health_check(&self) -> bool {
        let limit = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(limit, self.client.list_local_models()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!("Ollama health check failed: {}", e);
                false
            }
            Err(_) => {
                warn!("Ollama health check timed out after {:?}", limit);
                false
            }
        }
    }

    /// Ask the model for a label; any failure or empty reply is Neutral
    pub async fn label(&self, text: &str) -> SentimentLabel {
        if text.trim().is_empty() {
            return SentimentLabel::Neutral;
        }

        let request = ChatMessageRequest::new(
            self.config.model.clone(),
            vec![ChatMessage::user(sentiment_prompt(text))],
        );
        let limit = Duration::from_secs(self.config.timeout_secs);

        match tokio::time::timeout(limit, self.client.send_chat_messages(request)).await {
            Ok(Ok(response)) => {
                let label = SentimentLabel::parse_reply(&response.message.content);
                debug!("Ollama labeled text as {:?}", label);
                label
            }
            Ok(Err(e)) => {
                warn!("Ollama sentiment failed, using Neutral: {}", e);
                SentimentLabel::Neutral
            }
            Err(_) => {
                warn!("Ollama sentiment timed out after {:?}, using Neutral", limit);
                SentimentLabel::Neutral
            }
        }
    }
}

#[async_trait]
impl SentimentScorer for OllamaSentiment {
    async fn score(&self, text: &str) -> f64 {
        self.label(text).await.score()
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
