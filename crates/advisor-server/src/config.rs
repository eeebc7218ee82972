//! Server Configuration

use std::str::FromStr;

use stock_advisor::{AdvisorConfig, AdvisorError};

/// Where market data comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarketSource {
    Yahoo,
    Mock,
}

impl FromStr for MarketSource {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(MarketSource::Yahoo),
            "mock" => Ok(MarketSource::Mock),
            other => Err(AdvisorError::Config(format!(
                "MARKET_DATA must be 'yahoo' or 'mock', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub market_source: MarketSource,
    pub advisor: AdvisorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            market_source: MarketSource::Yahoo,
            advisor: AdvisorConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AdvisorError> {
        let defaults = Self::default();
        let market_source = match std::env::var("MARKET_DATA") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.market_source,
        };

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            market_source,
            advisor: AdvisorConfig::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_source() {
        assert_eq!("Mock".parse::<MarketSource>().unwrap(), MarketSource::Mock);
        assert_eq!(" yahoo ".parse::<MarketSource>().unwrap(), MarketSource::Yahoo);
        assert!(matches!("bloomberg".parse::<MarketSource>(), Err(AdvisorError::Config(_))));
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.market_source, MarketSource::Yahoo);
    }
}
