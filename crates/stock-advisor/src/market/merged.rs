//! News fan-in across providers

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::warn;

use super::NewsClient;
use crate::error::{AdvisorError, Result};
use crate::model::NewsArticle;

/// Concatenates every provider's articles in source order.
///
/// A failing provider is skipped; the fetch only fails when all of them do.
pub struct MergedNewsClient {
    sources: Vec<Arc<dyn NewsClient>>,
}

impl MergedNewsClient {
    pub fn new(sources: Vec<Arc<dyn NewsClient>>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name())
    }
}

#[async_trait]
impl NewsClient for MergedNewsClient {
    async fn fetch_recent(&self, ticker: &str) -> Result<Vec<NewsArticle>> {
        let results = join_all(self.sources.iter().map(|s| s.fetch_recent(ticker))).await;

        let mut articles = Vec::new();
        let mut last_error = None;
        let mut succeeded = false;

        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(batch) => {
                    succeeded = true;
                    articles.extend(batch);
                }
                Err(e) => {
                    warn!("{} news unavailable for {}: {}", source.name(), ticker, e);
                    last_error = Some(e);
                }
            }
        }

        match (succeeded, last_error) {
            (false, Some(e)) => Err(e),
            (false, None) => Err(AdvisorError::Config("no news sources configured".into())),
            _ => Ok(articles),
        }
    }

    fn name(&self) -> &str {
        "Merged"
    }
}
