//! Mock torrent client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent_client::{
    AddTorrentRequest, AddTorrentResult, TorrentClient, TorrentClientError, TorrentInfo,
    TorrentState,
};

/// Size of the fake episode file written on add.
pub const MOCK_PAYLOAD_BYTES: usize = 4096;

/// Internal state for a mock torrent.
#[derive(Debug, Clone)]
struct MockTorrent {
    info: TorrentInfo,
    /// Progress values handed out by successive `get_torrent` calls.
    pending_progress: VecDeque<f64>,
}

/// Mock implementation of the TorrentClient trait.
///
/// Adding a torrent writes a small payload into the requested output
/// folder, laid out the way a real release is:
///
/// ```text
/// <output_folder>/<name>/<name>.mkv          (MOCK_PAYLOAD_BYTES)
/// <output_folder>/<name>/Sample/sample.mkv   (small)
/// <output_folder>/<name>/<name>.nfo
/// ```
///
/// By default every torrent reports complete on the first poll. Use
/// [`MockTorrentClient::set_progress_steps`] to walk through intermediate
/// progress, or [`MockTorrentClient::set_stalled`] to never advance.
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    added: Arc<RwLock<Vec<AddTorrentRequest>>>,
    removed: Arc<RwLock<Vec<(String, bool)>>>,
    torrents: Arc<RwLock<HashMap<String, MockTorrent>>>,
    progress_steps: Arc<RwLock<Vec<f64>>>,
    stalled: Arc<RwLock<bool>>,
    failure: Arc<RwLock<Option<String>>>,
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
}

impl MockTorrentClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded add_torrent requests.
    pub async fn added_torrents(&self) -> Vec<AddTorrentRequest> {
        self.added.read().await.clone()
    }

    pub async fn add_count(&self) -> usize {
        self.added.read().await.len()
    }

    /// Recorded remove_torrent calls as `(hash, delete_files)`.
    pub async fn removed_torrents(&self) -> Vec<(String, bool)> {
        self.removed.read().await.clone()
    }

    /// Progress values (0.0 - 1.0) reported by successive polls of newly
    /// added torrents. The last value repeats once the list runs out.
    pub async fn set_progress_steps(&self, steps: Vec<f64>) {
        *self.progress_steps.write().await = steps;
    }

    /// Keep newly added torrents at 0% forever.
    pub async fn set_stalled(&self, stalled: bool) {
        *self.stalled.write().await = stalled;
    }

    /// Report newly added torrents in the error state with this message.
    pub async fn set_failure(&self, message: impl Into<String>) {
        *self.failure.write().await = Some(message.into());
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<TorrentClientError> {
        self.next_error.write().await.take()
    }

    /// Extract `(hash, display name)` from a magnet URI.
    fn parse_magnet(uri: &str) -> Option<(String, Option<String>)> {
        let params = uri.strip_prefix("magnet:?")?;
        let mut hash = None;
        let mut name = None;
        for part in params.split('&') {
            if let Some(h) = part.strip_prefix("xt=urn:btih:") {
                hash = Some(h.to_lowercase());
            } else if let Some(dn) = part.strip_prefix("dn=") {
                name = urlencoding::decode(dn).ok().map(|s| s.into_owned());
            }
        }
        hash.map(|h| (h, name))
    }

    fn write_payload(folder: &Path, name: &str) -> std::io::Result<PathBuf> {
        let release_dir = folder.join(name);
        std::fs::create_dir_all(release_dir.join("Sample"))?;
        std::fs::write(release_dir.join(format!("{}.nfo", name)), b"release info")?;
        std::fs::write(release_dir.join("Sample").join("sample.mkv"), vec![0u8; 64])?;
        std::fs::write(
            release_dir.join(format!("{}.mkv", name)),
            vec![0u8; MOCK_PAYLOAD_BYTES],
        )?;
        Ok(release_dir)
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.added.write().await.push(request.clone());

        let (hash, name) = Self::parse_magnet(&request.magnet)
            .ok_or_else(|| TorrentClientError::InvalidTorrent(request.magnet.clone()))?;
        let name = name.unwrap_or_else(|| format!("mock-{}", hash));

        if let Some(folder) = &request.output_folder {
            Self::write_payload(folder, &name)
                .map_err(|e| TorrentClientError::Internal(e.to_string()))?;
        }

        let failure = self.failure.read().await.clone();
        let pending_progress = if *self.stalled.read().await {
            VecDeque::from(vec![0.0])
        } else {
            let steps = self.progress_steps.read().await.clone();
            if steps.is_empty() {
                VecDeque::from(vec![1.0])
            } else {
                VecDeque::from(steps)
            }
        };

        let info = TorrentInfo {
            hash: hash.clone(),
            name: name.clone(),
            state: if failure.is_some() {
                TorrentState::Error
            } else {
                TorrentState::Checking
            },
            progress: 0.0,
            size_bytes: MOCK_PAYLOAD_BYTES as u64,
            downloaded_bytes: 0,
            download_speed: 0,
            peers: 3,
            eta_secs: None,
            save_path: request.output_folder.clone(),
            error: failure,
        };

        self.torrents.write().await.insert(
            hash.clone(),
            MockTorrent {
                info,
                pending_progress,
            },
        );

        Ok(AddTorrentResult {
            hash,
            name: Some(name),
        })
    }

    async fn get_torrent(&self, hash: &str) -> Result<TorrentInfo, TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let mut torrents = self.torrents.write().await;
        let torrent = torrents
            .get_mut(hash)
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))?;

        if torrent.info.state == TorrentState::Error {
            return Ok(torrent.info.clone());
        }

        let progress = if torrent.pending_progress.len() > 1 {
            torrent.pending_progress.pop_front()
        } else {
            torrent.pending_progress.front().copied()
        }
        .unwrap_or(1.0)
        .clamp(0.0, 1.0);

        let info = &mut torrent.info;
        let remaining = ((1.0 - progress) * info.size_bytes as f64) as u64;
        info.progress = progress;
        info.downloaded_bytes = info.size_bytes - remaining;
        if progress >= 1.0 {
            info.state = TorrentState::Seeding;
            info.download_speed = 0;
            info.eta_secs = None;
        } else {
            info.state = TorrentState::Downloading;
            let speed: u64 = if progress > 0.0 { 1024 } else { 0 };
            info.download_speed = speed;
            info.eta_secs = (speed > 0).then(|| remaining / speed);
        }

        Ok(info.clone())
    }

    async fn remove_torrent(
        &self,
        hash: &str,
        delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.removed
            .write()
            .await
            .push((hash.to_string(), delete_files));

        if self.torrents.write().await.remove(hash).is_some() {
            Ok(())
        } else {
            Err(TorrentClientError::TorrentNotFound(hash.to_string()))
        }
    }
}
