//! OpenSubtitles.com REST API (v1) client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{SubtitleCandidate, SubtitleError, SubtitleProvider, SubtitleSearch};
use crate::config::OpenSubtitlesConfig;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    user: Option<LoginUser>,
}

#[derive(Debug, Deserialize)]
struct LoginUser {
    #[serde(default)]
    allowed_downloads: Option<i64>,
    #[serde(default)]
    remaining_downloads: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_count: Option<i64>,
    #[serde(default)]
    data: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    attributes: SearchAttributes,
}

#[derive(Debug, Deserialize)]
struct SearchAttributes {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    download_count: Option<u64>,
    #[serde(default)]
    release: Option<String>,
    #[serde(default)]
    files: Vec<SearchFile>,
}

#[derive(Debug, Deserialize)]
struct SearchFile {
    file_id: u64,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: String,
    #[serde(default)]
    remaining: Option<i64>,
}

/// OpenSubtitles API client.
///
/// Searching works with the API key alone; download links need the bearer
/// token obtained by [`SubtitleProvider::login`].
pub struct OpenSubtitlesClient {
    client: Client,
    config: OpenSubtitlesConfig,
    token: RwLock<Option<String>>,
}

impl OpenSubtitlesClient {
    pub fn new(config: OpenSubtitlesConfig) -> Result<Self, SubtitleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SubtitleError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            token: RwLock::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn with_api_key(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.config.api_key)
            .header("Accept", "application/json")
    }

    async fn check_status(response: Response, what: &str) -> Result<Response, SubtitleError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(200).collect();
        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => SubtitleError::RateLimited,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                SubtitleError::AuthFailed(format!("{} rejected (HTTP {}): {}", what, status, body))
            }
            _ => SubtitleError::ApiError(format!("{} failed (HTTP {}): {}", what, status, body)),
        })
    }
}

#[async_trait]
impl SubtitleProvider for OpenSubtitlesClient {
    fn name(&self) -> &str {
        "opensubtitles"
    }

    async fn login(&self) -> Result<(), SubtitleError> {
        info!(username = %self.config.username, "Logging into OpenSubtitles");

        let response = self
            .with_api_key(self.client.post(self.endpoint("login")))
            .json(&serde_json::json!({
                "username": self.config.username,
                "password": self.config.password,
            }))
            .send()
            .await?;

        let response = Self::check_status(response, "login").await.map_err(|e| match e {
            SubtitleError::ApiError(msg) => SubtitleError::AuthFailed(msg),
            other => other,
        })?;

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| SubtitleError::InvalidResponse(format!("login: {}", e)))?;

        if let Some(user) = &login.user {
            info!(
                allowed_downloads = ?user.allowed_downloads,
                remaining_downloads = ?user.remaining_downloads,
                "OpenSubtitles login successful"
            );
        }

        *self.token.write().await = Some(login.token);
        Ok(())
    }

    async fn search(
        &self,
        query: &SubtitleSearch,
    ) -> Result<Vec<SubtitleCandidate>, SubtitleError> {
        debug!(?query, "Searching OpenSubtitles");

        let response = self
            .with_api_key(self.client.get(self.endpoint("subtitles")))
            .query(&[
                ("query", query.title.clone()),
                ("season_number", query.season.to_string()),
                ("episode_number", query.episode.to_string()),
                ("languages", query.language.clone()),
            ])
            .send()
            .await?;
        let response = Self::check_status(response, "search").await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SubtitleError::InvalidResponse(format!("search: {}", e)))?;

        let candidates = flatten_search(body.data, &query.language);
        debug!(
            total_count = ?body.total_count,
            files = candidates.len(),
            "OpenSubtitles search completed"
        );
        Ok(candidates)
    }

    async fn download_link(&self, file_id: u64) -> Result<String, SubtitleError> {
        let token = self
            .token
            .read()
            .await
            .clone()
            .ok_or(SubtitleError::NotLoggedIn)?;

        let response = self
            .with_api_key(self.client.post(self.endpoint("download")))
            .bearer_auth(token)
            .json(&serde_json::json!({ "file_id": file_id }))
            .send()
            .await?;
        let response = Self::check_status(response, "download").await?;

        let download: DownloadResponse = response
            .json()
            .await
            .map_err(|e| SubtitleError::InvalidResponse(format!("download: {}", e)))?;

        debug!(file_id, remaining = ?download.remaining, "Got subtitle download link");
        Ok(download.link)
    }

    async fn fetch(&self, link: &str) -> Result<Vec<u8>, SubtitleError> {
        let response = self.client.get(link).send().await?;
        let response = Self::check_status(response, "fetch").await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// One candidate per file; entries listing several files yield several.
fn flatten_search(entries: Vec<SearchEntry>, language: &str) -> Vec<SubtitleCandidate> {
    entries
        .into_iter()
        .flat_map(|entry| {
            let attrs = entry.attributes;
            let language = attrs.language.unwrap_or_else(|| language.to_string());
            let release = attrs.release;
            let download_count = attrs.download_count.unwrap_or(0);
            attrs.files.into_iter().map(move |file| SubtitleCandidate {
                file_id: file.file_id,
                file_name: file.file_name,
                release: release.clone(),
                language: language.clone(),
                download_count,
            })
        })
        .collect()
}
