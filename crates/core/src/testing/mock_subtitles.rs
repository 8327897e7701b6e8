//! Mock subtitle provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::subtitles::{SubtitleCandidate, SubtitleError, SubtitleProvider, SubtitleSearch};

const LINK_PREFIX: &str = "mock://subtitle/";

/// Mock implementation of the SubtitleProvider trait.
///
/// Search results are configured per language; file contents per file id.
/// Download links take the form `mock://subtitle/<file_id>`.
#[derive(Debug, Default)]
pub struct MockSubtitleProvider {
    results: Arc<RwLock<HashMap<String, Vec<SubtitleCandidate>>>>,
    files: Arc<RwLock<HashMap<u64, Vec<u8>>>>,
    searches: Arc<RwLock<Vec<SubtitleSearch>>>,
    downloads: Arc<RwLock<Vec<u64>>>,
    logins: Arc<RwLock<u32>>,
    login_failure: Arc<RwLock<Option<String>>>,
}

impl MockSubtitleProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results returned for searches in `language`.
    pub async fn set_results(&self, language: &str, results: Vec<SubtitleCandidate>) {
        self.results
            .write()
            .await
            .insert(language.to_string(), results);
    }

    /// Contents served for `file_id`.
    pub async fn set_file(&self, file_id: u64, contents: impl Into<Vec<u8>>) {
        self.files.write().await.insert(file_id, contents.into());
    }

    /// Make every login attempt fail with this message.
    pub async fn set_login_failure(&self, message: impl Into<String>) {
        *self.login_failure.write().await = Some(message.into());
    }

    pub async fn login_count(&self) -> u32 {
        *self.logins.read().await
    }

    pub async fn recorded_searches(&self) -> Vec<SubtitleSearch> {
        self.searches.read().await.clone()
    }

    /// File ids a download link was requested for.
    pub async fn downloaded_ids(&self) -> Vec<u64> {
        self.downloads.read().await.clone()
    }
}

#[async_trait]
impl SubtitleProvider for MockSubtitleProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn login(&self) -> Result<(), SubtitleError> {
        *self.logins.write().await += 1;
        match self.login_failure.read().await.as_ref() {
            Some(message) => Err(SubtitleError::AuthFailed(message.clone())),
            None => Ok(()),
        }
    }

    async fn search(
        &self,
        query: &SubtitleSearch,
    ) -> Result<Vec<SubtitleCandidate>, SubtitleError> {
        self.searches.write().await.push(query.clone());
        Ok(self
            .results
            .read()
            .await
            .get(&query.language)
            .cloned()
            .unwrap_or_default())
    }

    async fn download_link(&self, file_id: u64) -> Result<String, SubtitleError> {
        self.downloads.write().await.push(file_id);
        Ok(format!("{}{}", LINK_PREFIX, file_id))
    }

    async fn fetch(&self, link: &str) -> Result<Vec<u8>, SubtitleError> {
        let file_id: u64 = link
            .strip_prefix(LINK_PREFIX)
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| SubtitleError::InvalidResponse(format!("unknown link {}", link)))?;
        self.files
            .read()
            .await
            .get(&file_id)
            .cloned()
            .ok_or_else(|| SubtitleError::ApiError(format!("no file {}", file_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_download_uses_configured_file() {
        let provider = MockSubtitleProvider::new();
        provider.set_file(7, fixtures::SAMPLE_SRT).await;

        let text = provider.download(7).await.unwrap();
        assert!(text.starts_with("1\n00:00:01,000"));
        assert_eq!(provider.downloaded_ids().await, vec![7]);
    }

    #[tokio::test]
    async fn test_search_by_language() {
        let provider = MockSubtitleProvider::new();
        provider
            .set_results("en", vec![fixtures::subtitle_candidate(1, "Show.S01E02.720p.srt", "en")])
            .await;

        let query = SubtitleSearch {
            title: "Show".into(),
            season: 1,
            episode: 2,
            language: "he".into(),
        };
        assert!(provider.search(&query).await.unwrap().is_empty());

        let query = SubtitleSearch {
            language: "en".into(),
            ..query
        };
        assert_eq!(provider.search(&query).await.unwrap().len(), 1);
    }
}
