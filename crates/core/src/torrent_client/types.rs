//! Types for torrent client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("Invalid torrent data: {0}")]
    InvalidTorrent(String),

    #[error("Timed out after {0}s waiting for torrent metadata")]
    MetadataTimeout(u64),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// State of a torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    /// Downloading from peers.
    Downloading,
    /// All pieces present.
    Seeding,
    Paused,
    /// Checking file integrity or waiting for metadata.
    Checking,
    Error,
    Unknown,
}

impl TorrentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentState::Downloading => "downloading",
            TorrentState::Seeding => "seeding",
            TorrentState::Paused => "paused",
            TorrentState::Checking => "checking",
            TorrentState::Error => "error",
            TorrentState::Unknown => "unknown",
        }
    }
}

/// Snapshot of a torrent's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Info hash (lowercase hex).
    pub hash: String,
    pub name: String,
    pub state: TorrentState,
    /// Download progress (0.0 - 1.0).
    pub progress: f64,
    pub size_bytes: u64,
    pub downloaded_bytes: u64,
    /// Current download speed in bytes/second.
    pub download_speed: u64,
    /// Connected peers.
    pub peers: u32,
    /// ETA in seconds (None if unknown or complete).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_secs: Option<u64>,
    /// Folder the payload is written into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_path: Option<PathBuf>,
    /// Error reported by the client when `state` is `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TorrentInfo {
    pub fn is_complete(&self) -> bool {
        self.state == TorrentState::Seeding || self.progress >= 1.0
    }
}

/// Request to add a new torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTorrentRequest {
    /// Magnet URI.
    pub magnet: String,
    /// Folder for this torrent's payload. Falls back to the client default.
    pub output_folder: Option<PathBuf>,
}

impl AddTorrentRequest {
    pub fn magnet(uri: impl Into<String>) -> Self {
        Self {
            magnet: uri.into(),
            output_folder: None,
        }
    }

    pub fn with_output_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_folder = Some(path.into());
        self
    }
}

/// Result of adding a torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTorrentResult {
    /// Info hash of the added torrent.
    pub hash: String,
    /// Name of the torrent, if metadata is already known.
    pub name: Option<String>,
}

/// Trait for torrent client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Add a new torrent, or return the existing one with the same hash.
    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError>;

    /// Get a specific torrent by hash.
    async fn get_torrent(&self, hash: &str) -> Result<TorrentInfo, TorrentClientError>;

    /// Remove a torrent.
    /// If `delete_files` is true, also delete downloaded files.
    async fn remove_torrent(&self, hash: &str, delete_files: bool)
        -> Result<(), TorrentClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torrent_state_as_str() {
        assert_eq!(TorrentState::Downloading.as_str(), "downloading");
        assert_eq!(TorrentState::Seeding.as_str(), "seeding");
        assert_eq!(TorrentState::Checking.as_str(), "checking");
        assert_eq!(TorrentState::Error.as_str(), "error");
    }

    #[test]
    fn test_torrent_state_serialization() {
        assert_eq!(
            serde_json::to_string(&TorrentState::Downloading).unwrap(),
            "\"downloading\""
        );
    }

    #[test]
    fn test_add_torrent_request_builder() {
        let req = AddTorrentRequest::magnet("magnet:?xt=urn:btih:abc123")
            .with_output_folder("/out/Show/S01E02/.incomplete");
        assert_eq!(req.magnet, "magnet:?xt=urn:btih:abc123");
        assert_eq!(
            req.output_folder,
            Some(PathBuf::from("/out/Show/S01E02/.incomplete"))
        );
    }

    #[test]
    fn test_is_complete() {
        let mut info = TorrentInfo {
            hash: "abc".into(),
            name: "x".into(),
            state: TorrentState::Downloading,
            progress: 0.5,
            size_bytes: 100,
            downloaded_bytes: 50,
            download_speed: 0,
            peers: 0,
            eta_secs: None,
            save_path: None,
            error: None,
        };
        assert!(!info.is_complete());
        info.state = TorrentState::Seeding;
        assert!(info.is_complete());
    }
}
