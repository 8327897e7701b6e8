//! Mock searcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::searcher::{SearchError, SearchQuery, SearchResult, Searcher, TorrentCandidate};

/// Mock implementation of the Searcher trait.
///
/// Returns the configured candidates for every query and records the
/// queries it was asked.
///
/// # Example
///
/// ```rust,ignore
/// use subgrab_core::testing::{MockSearcher, fixtures};
///
/// let searcher = MockSearcher::new();
/// searcher
///     .set_results(vec![fixtures::torrent_candidate("Show.S01E02.1080p", "abc", 40)])
///     .await;
///
/// let result = searcher.search(&SearchQuery::new("Show S01E02")).await?;
/// assert_eq!(result.candidates.len(), 1);
/// assert_eq!(searcher.search_count().await, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockSearcher {
    results: Arc<RwLock<Vec<TorrentCandidate>>>,
    searches: Arc<RwLock<Vec<SearchQuery>>>,
    /// If set, the next search fails with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the results to return for subsequent searches.
    pub async fn set_results(&self, results: Vec<TorrentCandidate>) {
        *self.results.write().await = results;
    }

    /// Queries searched so far, oldest first.
    pub async fn recorded_searches(&self) -> Vec<SearchQuery> {
        self.searches.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
        self.searches.write().await.push(query.clone());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(SearchResult {
            query: query.clone(),
            candidates: self.results.read().await.clone(),
            duration_ms: 0,
            category_errors: HashMap::new(),
        })
    }
}
