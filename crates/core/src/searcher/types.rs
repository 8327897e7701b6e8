//! Types for the torrent search system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Query parameters for a torrent search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text search query.
    pub query: String,
    /// Index categories to search. Empty means the backend's defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<u32>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            categories: Vec::new(),
        }
    }
}

/// A torrent search result (deduplicated by info_hash).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TorrentCandidate {
    /// Release title as listed by the index.
    pub name: String,
    /// Info hash (lowercase hex).
    pub info_hash: String,
    /// Swarm seeders; 0 when the index reported nothing usable.
    pub seeders: u32,
    pub leechers: u32,
    pub size_bytes: u64,
    /// Index category the release was listed under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
}

/// Search result with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The search query that was executed.
    pub query: SearchQuery,
    /// Deduplicated results, in index order.
    pub candidates: Vec<TorrentCandidate>,
    /// How long the search took in milliseconds.
    pub duration_ms: u64,
    /// Categories whose request failed (category -> error message).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub category_errors: HashMap<u32, String>,
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("All categories failed: {0:?}")]
    AllCategoriesFailed(HashMap<u32, String>),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait for torrent search backends.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Execute a search. An empty candidate list is not an error here.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_serialization() {
        let query = SearchQuery {
            query: "Show S01E02".to_string(),
            categories: vec![205, 208],
        };

        let json = serde_json::to_string(&query).unwrap();
        let parsed: SearchQuery = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, query);

        let bare = serde_json::to_string(&SearchQuery::new("x")).unwrap();
        assert!(!bare.contains("categories"));
    }

    #[test]
    fn test_candidate_default_is_empty() {
        let c = TorrentCandidate::default();
        assert!(c.name.is_empty());
        assert_eq!(c.seeders, 0);
        assert!(c.publish_date.is_none());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            SearchError::ApiError("HTTP 502".into()).to_string(),
            "Search backend API error: HTTP 502"
        );
        assert_eq!(SearchError::Timeout.to_string(), "Request timeout");
    }
}
