//! Suggestion Sampler
//!
//! Picks 3 to 5 alternative stocks from a volatility tier matching the risk
//! score. Candidates without a usable quote are skipped; the whole-universe
//! pass and then a fixed fallback list guarantee the minimum count.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::error::{AdvisorError, Result};
use crate::market::{MarketDataClient, with_timeout};
use crate::model::SuggestedStock;

pub const HIGH_VOLATILITY: &[&str] = &[
    "TSLA", "NVDA", "COIN", "AMD", "SHOP", "SQ", "META", "NFLX", "PLTR", "AFRM", "RIVN", "SNAP",
    "UBER", "ABNB", "CRWD", "DDOG", "ROKU", "LI",
];

pub const MEDIUM_VOLATILITY: &[&str] = &[
    "AAPL", "MSFT", "AMZN", "GOOG", "V", "MA", "JPM", "COST", "AVGO", "ORCL", "HD", "ADBE", "INTC",
    "CSCO", "QCOM", "TXN", "DIS",
];

pub const LOW_VOLATILITY: &[&str] = &[
    "PG", "JNJ", "KO", "MCD", "PEP", "MRK", "WMT", "UNH", "HD", "COST", "CVS", "T", "VZ", "PFE",
];

/// Last resort when no candidate quote can be fetched
const FALLBACK: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corp."),
    ("GOOGL", "Alphabet Inc."),
    ("AMZN", "Amazon.com Inc."),
    ("JNJ", "Johnson & Johnson"),
];

pub const MIN_SUGGESTIONS: usize = 3;
pub const MAX_SUGGESTIONS: usize = 5;
const FIRST_DRAW: usize = 7;
const WIDENED_DRAW: usize = 10;

/// Ordered union of tiers without duplicates or the subject ticker
fn candidate_pool(tiers: &[&[&str]], exclude: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tiers
        .iter()
        .flat_map(|tier| tier.iter())
        .map(|t| t.to_uppercase())
        .filter(|t| !exclude.contains(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Tier(s) to sample from for a risk score
pub fn tiers_for(risk_score: f64) -> Vec<&'static [&'static str]> {
    if risk_score > 70.0 {
        vec![HIGH_VOLATILITY, MEDIUM_VOLATILITY]
    } else if risk_score > 50.0 {
        vec![MEDIUM_VOLATILITY, LOW_VOLATILITY]
    } else {
        vec![LOW_VOLATILITY]
    }
}

pub struct SuggestionSampler {
    market: Arc<dyn MarketDataClient>,
    fetch_timeout: Duration,
}

impl SuggestionSampler {
    pub fn new(market: Arc<dyn MarketDataClient>, fetch_timeout: Duration) -> Self {
        Self { market, fetch_timeout }
    }

    pub async fn suggest<R>(&self, risk_score: f64, subject: &str, rng: &mut R) -> Result<Vec<SuggestedStock>>
    where
        R: Rng + Send,
    {
        let subject = subject.trim().to_uppercase();
        let mut excluded: HashSet<String> = HashSet::from([subject.clone()]);

        let mut pool = candidate_pool(&tiers_for(risk_score), &excluded);
        pool.shuffle(rng);
        pool.truncate(FIRST_DRAW);

        let mut accepted = self.quote_all(&pool).await;
        accepted.truncate(MAX_SUGGESTIONS);

        if accepted.len() < MIN_SUGGESTIONS {
            debug!("Only {} suggestions for {}, widening to all tiers", accepted.len(), subject);
            excluded.extend(accepted.iter().map(|s| s.ticker.clone()));

            let mut widened = candidate_pool(
                &[HIGH_VOLATILITY, MEDIUM_VOLATILITY, LOW_VOLATILITY],
                &excluded,
            );
            widened.shuffle(rng);
            widened.truncate(WIDENED_DRAW);

            let missing = MIN_SUGGESTIONS - accepted.len();
            accepted.extend(self.quote_all(&widened).await.into_iter().take(missing));
        }

        if accepted.len() < MIN_SUGGESTIONS {
            warn!("No live quotes for suggestions to {}, using fallback list", subject);
            for (ticker, name) in FALLBACK {
                if accepted.len() >= MIN_SUGGESTIONS {
                    break;
                }
                if *ticker == subject || accepted.iter().any(|s| s.ticker == *ticker) {
                    continue;
                }
                accepted.push(SuggestedStock::new(*ticker, *name, 0.0, 1.0));
            }
        }

        if accepted.len() < MIN_SUGGESTIONS {
            return Err(AdvisorError::DataInsufficient(format!(
                "could not assemble {} suggestions for {}",
                MIN_SUGGESTIONS, subject
            )));
        }

        Ok(accepted)
    }

    /// Fetch metadata for all tickers at once; keep usable quotes in input order.
    async fn quote_all(&self, tickers: &[String]) -> Vec<SuggestedStock> {
        let fetches = tickers.iter().map(|ticker| {
            with_timeout(
                self.market.name(),
                self.fetch_timeout,
                self.market.fetch_metadata(ticker),
            )
        });
        let results = join_all(fetches).await;

        tickers
            .iter()
            .zip(results)
            .filter_map(|(ticker, result)| match result {
                Ok(meta) => {
                    let Some(price) = meta.last_price else {
                        debug!("Skipping {}: no price", ticker);
                        return None;
                    };
                    let name = meta.short_name.unwrap_or_else(|| ticker.clone());
                    Some(SuggestedStock::new(ticker.as_str(), name, price, meta.beta.unwrap_or(1.0)))
                }
                Err(e) => {
                    debug!("Skipping {}: {}", ticker, e);
                    None
                }
            })
            .collect()
    }
}
