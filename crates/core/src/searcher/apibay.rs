//! Apibay-style JSON index backend.
//!
//! `GET <base>/q.php?q=<query>&cat=<category>` answers with a JSON array in
//! which every number is a string. An empty search answers with a single
//! placeholder entry whose info hash is all zeros.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::SearcherConfig;

use super::dedup::deduplicate_results;
use super::{SearchError, SearchQuery, SearchResult, Searcher, TorrentCandidate};

/// Category id the index treats as "any category".
const ALL_CATEGORIES: u32 = 0;

const EMPTY_RESULT_HASH: &str = "0000000000000000000000000000000000000000";

/// One listing as returned by the index.
///
/// Numeric fields are usually strings but mirrors also send numbers or
/// `null`; anything unusable reads as empty.
#[derive(Debug, Deserialize)]
struct ApibayListing {
    name: String,
    info_hash: String,
    #[serde(default, deserialize_with = "lenient_text")]
    seeders: String,
    #[serde(default, deserialize_with = "lenient_text")]
    leechers: String,
    #[serde(default, deserialize_with = "lenient_text")]
    size: String,
    #[serde(default, deserialize_with = "lenient_text")]
    added: String,
    #[serde(default, deserialize_with = "lenient_text")]
    category: String,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

impl ApibayListing {
    fn into_candidate(self) -> Option<TorrentCandidate> {
        if self.info_hash.is_empty() || self.info_hash == EMPTY_RESULT_HASH {
            return None;
        }
        Some(TorrentCandidate {
            name: self.name,
            info_hash: self.info_hash.to_lowercase(),
            seeders: parse_count(&self.seeders),
            leechers: parse_count(&self.leechers),
            size_bytes: self.size.trim().parse().unwrap_or(0),
            category: (!self.category.is_empty()).then_some(self.category),
            publish_date: parse_added(&self.added),
        })
    }
}

/// Apibay search backend implementation.
pub struct ApibaySearcher {
    client: Client,
    config: SearcherConfig,
}

impl ApibaySearcher {
    /// Create a new searcher with the given configuration.
    pub fn new(config: SearcherConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn build_search_url(&self, query: &str, category: u32) -> String {
        format!(
            "{}/q.php?q={}&cat={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(query),
            category
        )
    }

    async fn search_category(
        &self,
        query: &str,
        category: u32,
    ) -> Result<Vec<TorrentCandidate>, SearchError> {
        let url = self.build_search_url(query, category);
        debug!(category, query, "Searching index");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout
            } else if e.is_connect() {
                SearchError::ConnectionFailed(e.to_string())
            } else {
                SearchError::ApiError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::ApiError(format!("Failed to read response: {}", e)))?;
        let candidates = parse_listings(&body)?;

        debug!(category, results = candidates.len(), "Category search complete");
        Ok(candidates)
    }
}

#[async_trait]
impl Searcher for ApibaySearcher {
    fn name(&self) -> &str {
        "apibay"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
        let start = Instant::now();
        let mut categories = if query.categories.is_empty() {
            self.config.categories.clone()
        } else {
            query.categories.clone()
        };
        if categories.is_empty() {
            categories.push(ALL_CATEGORIES);
        }

        let futures: Vec<_> = categories
            .iter()
            .map(|&category| async move {
                (category, self.search_category(&query.query, category).await)
            })
            .collect();
        let results = futures::future::join_all(futures).await;

        let mut all_raw = Vec::new();
        let mut category_errors = HashMap::new();
        for (category, result) in results {
            match result {
                Ok(mut found) => all_raw.append(&mut found),
                Err(e) => {
                    warn!(category, error = %e, "Category search failed");
                    category_errors.insert(category, e.to_string());
                }
            }
        }

        if !category_errors.is_empty() && category_errors.len() == categories.len() {
            return Err(SearchError::AllCategoriesFailed(category_errors));
        }

        let candidates = deduplicate_results(all_raw);
        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            query = %query.query,
            results = candidates.len(),
            duration_ms,
            "Search complete"
        );

        Ok(SearchResult {
            query: query.clone(),
            candidates,
            duration_ms,
            category_errors,
        })
    }
}

/// Parse an index response body, dropping the empty-result placeholder.
fn parse_listings(body: &str) -> Result<Vec<TorrentCandidate>, SearchError> {
    let listings: Vec<ApibayListing> = serde_json::from_str(body)
        .map_err(|e| SearchError::ApiError(format!("Failed to parse response: {}", e)))?;
    Ok(listings
        .into_iter()
        .filter_map(ApibayListing::into_candidate)
        .collect())
}

fn parse_count(raw: &str) -> u32 {
    raw.trim().parse::<u32>().unwrap_or(0)
}

fn parse_added(raw: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = raw.trim().parse().ok()?;
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn searcher(url: &str) -> ApibaySearcher {
        ApibaySearcher::new(SearcherConfig {
            url: url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_build_search_url() {
        let s = searcher("https://apibay.example/");
        assert_eq!(
            s.build_search_url("Rick and Morty S08E05", 208),
            "https://apibay.example/q.php?q=Rick%20and%20Morty%20S08E05&cat=208"
        );
    }

    #[test]
    fn test_parse_listings() {
        let body = r#"[
            {"id":"1","name":"Show.S01E02.1080p.WEB","info_hash":"ABCDEF0123456789ABCDEF0123456789ABCDEF01",
             "leechers":"4","seeders":"120","num_files":"1","size":"1500000000","username":"u",
             "added":"1700000000","status":"vip","category":"208","imdb":""},
            {"id":"2","name":"Show.S01E02.720p","info_hash":"1111111111111111111111111111111111111111",
             "leechers":"x","seeders":"","size":"","added":"0","category":"205"}
        ]"#;

        let parsed = parse_listings(body).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].seeders, 120);
        assert_eq!(parsed[0].leechers, 4);
        assert_eq!(parsed[0].info_hash, "abcdef0123456789abcdef0123456789abcdef01");
        assert_eq!(parsed[0].category.as_deref(), Some("208"));
        assert!(parsed[0].publish_date.is_some());
        assert_eq!(parsed[1].seeders, 0);
        assert_eq!(parsed[1].leechers, 0);
        assert!(parsed[1].publish_date.is_none());
    }

    #[test]
    fn test_parse_tolerates_numbers_and_nulls() {
        let body = r#"[
            {"name":"Show.S01E02.1080p","info_hash":"2222222222222222222222222222222222222222",
             "seeders":42,"leechers":null,"size":1500000000,"added":1700000000,"category":208},
            {"name":"Show.S01E02.720p","info_hash":"3333333333333333333333333333333333333333",
             "seeders":null,"leechers":"7","size":null,"added":null,"category":null}
        ]"#;

        let parsed = parse_listings(body).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].seeders, 42);
        assert_eq!(parsed[0].leechers, 0);
        assert_eq!(parsed[0].size_bytes, 1_500_000_000);
        assert!(parsed[0].publish_date.is_some());
        assert_eq!(parsed[0].category.as_deref(), Some("208"));
        assert_eq!(parsed[1].seeders, 0);
        assert_eq!(parsed[1].leechers, 7);
        assert_eq!(parsed[1].size_bytes, 0);
        assert!(parsed[1].publish_date.is_none());
        assert!(parsed[1].category.is_none());
    }

    #[test]
    fn test_parse_drops_no_results_placeholder() {
        let body = r#"[{"id":"0","name":"No results returned","info_hash":"0000000000000000000000000000000000000000",
            "leechers":"0","seeders":"0","num_files":"0","size":"0","username":"","added":"0","status":"member","category":"0","imdb":""}]"#;
        assert!(parse_listings(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_body() {
        assert!(matches!(
            parse_listings("<html>"),
            Err(SearchError::ApiError(_))
        ));
    }

    #[tokio::test]
    async fn test_search_unreachable_backend_fails() {
        let s = ApibaySearcher::new(SearcherConfig {
            url: "http://127.0.0.1:9".to_string(),
            categories: vec![205],
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();

        let err = s.search(&SearchQuery::new("anything")).await.unwrap_err();
        assert!(matches!(err, SearchError::AllCategoriesFailed(_)));
    }
}
