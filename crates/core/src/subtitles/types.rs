//! Types for subtitle providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One downloadable subtitle file offered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCandidate {
    /// Provider file id, needed to request a download link.
    pub file_id: u64,
    /// File name as uploaded. Candidates without one are never matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Free-text release descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// ISO 639-1 language code.
    pub language: String,
    #[serde(default)]
    pub download_count: u64,
}

/// Episode subtitle lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleSearch {
    pub title: String,
    pub season: u32,
    pub episode: u32,
    /// ISO 639-1 language code.
    pub language: String,
}

/// Errors that can occur while talking to a subtitle provider.
#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Subtitle API error: {0}")]
    ApiError(String),

    #[error("Rate limited by subtitle provider")]
    RateLimited,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for SubtitleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SubtitleError::Timeout
        } else if e.is_connect() {
            SubtitleError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            SubtitleError::InvalidResponse(e.to_string())
        } else {
            SubtitleError::ApiError(e.to_string())
        }
    }
}

/// Trait for subtitle provider backends.
#[async_trait]
pub trait SubtitleProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Authenticate with the configured credentials.
    async fn login(&self) -> Result<(), SubtitleError>;

    /// Search subtitles for one episode in one language.
    async fn search(&self, query: &SubtitleSearch)
        -> Result<Vec<SubtitleCandidate>, SubtitleError>;

    /// Request a short-lived download link for a file.
    async fn download_link(&self, file_id: u64) -> Result<String, SubtitleError>;

    /// Fetch the bytes behind a download link.
    async fn fetch(&self, link: &str) -> Result<Vec<u8>, SubtitleError>;

    /// Resolve a link for `file_id` and return the subtitle as text.
    async fn download(&self, file_id: u64) -> Result<String, SubtitleError> {
        let link = self.download_link(file_id).await?;
        let bytes = self.fetch(&link).await?;
        Ok(super::srt::decode(&bytes))
    }
}
