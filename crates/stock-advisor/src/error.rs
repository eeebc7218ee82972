//! Error Types for Stock Advisor

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Machine-checkable failure category carried by every propagated error
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    DataInsufficient,
    InvalidInput,
    NotFound,
    UpstreamUnavailable,
    ModelUnavailable,
    Config,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::DataInsufficient => "DATA_INSUFFICIENT",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ErrorKind::ModelUnavailable => "MODEL_UNAVAILABLE",
            ErrorKind::Config => "CONFIG_ERROR",
        }
    }
}

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Insufficient data: {0}")]
    DataInsufficient(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{source_name} unavailable: {reason}")]
    UpstreamUnavailable {
        source_name: String,
        reason: String,
    },

    #[error("{source_name} timed out after {secs}s")]
    Timeout {
        source_name: String,
        secs: u64,
    },

    #[error("Prediction model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdvisorError {
    pub fn upstream(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        AdvisorError::UpstreamUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdvisorError::DataInsufficient(_) => ErrorKind::DataInsufficient,
            AdvisorError::InvalidInput(_) => ErrorKind::InvalidInput,
            AdvisorError::NotFound(_) => ErrorKind::NotFound,
            AdvisorError::UpstreamUnavailable { .. }
            | AdvisorError::Timeout { .. }
            | AdvisorError::Network(_)
            | AdvisorError::Serialization(_) => ErrorKind::UpstreamUnavailable,
            AdvisorError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            AdvisorError::Config(_) => ErrorKind::Config,
        }
    }

    /// Check if error is retryable
    ///
    /// Invalid input and a missing model need a caller or operator fix first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdvisorError::UpstreamUnavailable { .. }
                | AdvisorError::Timeout { .. }
                | AdvisorError::Network(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AdvisorError::DataInsufficient(msg) => format!("Not enough market data: {}", msg),
            AdvisorError::InvalidInput(msg) => msg.clone(),
            AdvisorError::NotFound(what) => format!("{} was not found.", what),
            AdvisorError::UpstreamUnavailable { source_name, .. } => {
                format!("The {} service is currently unavailable. Please try again.", source_name)
            }
            AdvisorError::Timeout { source_name, .. } => {
                format!("The {} service took too long to respond.", source_name)
            }
            AdvisorError::ModelUnavailable(_) => {
                "The prediction model is not available. Please contact the operator.".into()
            }
            AdvisorError::Network(_) | AdvisorError::Serialization(_) => {
                "A market data provider returned an unexpected response.".into()
            }
            AdvisorError::Config(_) => "Service configuration error.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            AdvisorError::InvalidInput("salary".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            AdvisorError::Timeout { source_name: "news".into(), secs: 8 }.kind(),
            ErrorKind::UpstreamUnavailable
        );
        assert_eq!(ErrorKind::ModelUnavailable.code(), "MODEL_UNAVAILABLE");
    }

    #[test]
    fn test_retryable() {
        assert!(AdvisorError::upstream("Yahoo", "502").is_retryable());
        assert!(!AdvisorError::ModelUnavailable("missing".into()).is_retryable());
        assert!(!AdvisorError::InvalidInput("salary".into()).is_retryable());
    }
}
