//! librqbit embedded torrent client implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use librqbit::{
    AddTorrent as RqbitAddTorrent, AddTorrentOptions, AddTorrentResponse, ManagedTorrent, Session,
    SessionOptions, SessionPersistenceConfig,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{AddTorrentRequest, AddTorrentResult, TorrentClient, TorrentClientError, TorrentInfo, TorrentState};
use crate::config::LibrqbitConfig;

/// Embedded librqbit torrent client.
pub struct LibrqbitClient {
    session: Arc<Session>,
    download_path: PathBuf,
    metadata_timeout: Duration,
    /// Output folder per hash, for torrents added with an override.
    folders: RwLock<HashMap<String, PathBuf>>,
}

impl LibrqbitClient {
    /// Create a new librqbit client from configuration.
    pub async fn new(config: &LibrqbitConfig) -> Result<Self, TorrentClientError> {
        let download_path = PathBuf::from(&config.download_path);

        if !download_path.exists() {
            std::fs::create_dir_all(&download_path).map_err(|e| {
                TorrentClientError::ConnectionFailed(format!(
                    "Failed to create download directory: {}",
                    e
                ))
            })?;
        }

        let mut opts = SessionOptions::default();

        if !config.enable_dht {
            opts.disable_dht = true;
        }

        // Range, not RangeInclusive
        if let Some(port) = config.listen_port {
            opts.listen_port_range = Some(port..(port + 1));
        }

        if let Some(ref persistence_path) = config.persistence_path {
            let persistence_dir = PathBuf::from(persistence_path);
            if !persistence_dir.exists() {
                std::fs::create_dir_all(&persistence_dir).map_err(|e| {
                    TorrentClientError::ConnectionFailed(format!(
                        "Failed to create persistence directory: {}",
                        e
                    ))
                })?;
            }
            opts.persistence = Some(SessionPersistenceConfig::Json {
                folder: Some(persistence_dir),
            });
        }

        info!(
            download_path = %download_path.display(),
            dht_enabled = !opts.disable_dht,
            "Initializing librqbit session"
        );

        let session = Session::new_with_opts(download_path.clone(), opts)
            .await
            .map_err(|e| {
                TorrentClientError::ConnectionFailed(format!(
                    "Failed to initialize librqbit session: {}",
                    e
                ))
            })?;

        if let Some(port) = session.tcp_listen_port() {
            info!(port = port, "librqbit listening on TCP port");
        }

        Ok(Self {
            session,
            download_path,
            metadata_timeout: Duration::from_secs(config.metadata_timeout_secs),
            folders: RwLock::new(HashMap::new()),
        })
    }

    /// Format info hash as lowercase hex string.
    fn format_hash(hash: &librqbit_core::Id20) -> String {
        hash.as_string()
    }

    async fn torrent_to_info(&self, torrent: &Arc<ManagedTorrent>) -> TorrentInfo {
        let hash = Self::format_hash(&torrent.info_hash());
        let stats = torrent.stats();

        let name = torrent
            .name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("torrent-{}", &hash[..8.min(hash.len())]));

        let state = map_state(&stats.state, torrent.is_paused(), stats.finished);

        let progress = if stats.total_bytes > 0 {
            stats.progress_bytes as f64 / stats.total_bytes as f64
        } else {
            0.0
        };

        let (download_speed, peers) = stats
            .live
            .as_ref()
            .map(|live| {
                // librqbit's "mbps" field holds MiB/s
                let dl_speed = (live.download_speed.mbps * 1024.0 * 1024.0) as u64;
                (dl_speed, live.snapshot.peer_stats.live as u32)
            })
            .unwrap_or((0, 0));

        let eta_secs = if state == TorrentState::Downloading && download_speed > 0 {
            let remaining = stats.total_bytes.saturating_sub(stats.progress_bytes);
            Some(remaining / download_speed)
        } else {
            None
        };

        let save_path = self
            .folders
            .read()
            .await
            .get(&hash)
            .cloned()
            .unwrap_or_else(|| self.download_path.clone());

        TorrentInfo {
            hash,
            name,
            state,
            progress,
            size_bytes: stats.total_bytes,
            downloaded_bytes: stats.progress_bytes,
            download_speed,
            peers,
            eta_secs,
            save_path: Some(save_path),
            error: stats.error.clone(),
        }
    }

    fn find_torrent(&self, hash: &str) -> Option<Arc<ManagedTorrent>> {
        let hash_lower = hash.to_lowercase();

        self.session.with_torrents(|iter| {
            for (_, torrent) in iter {
                if Self::format_hash(&torrent.info_hash()) == hash_lower {
                    return Some(torrent.clone());
                }
            }
            None
        })
    }
}

fn map_state(
    state: &librqbit::TorrentStatsState,
    is_paused: bool,
    is_finished: bool,
) -> TorrentState {
    use librqbit::TorrentStatsState;

    if is_paused {
        return TorrentState::Paused;
    }

    match state {
        TorrentStatsState::Initializing => TorrentState::Checking,
        TorrentStatsState::Live => {
            if is_finished {
                TorrentState::Seeding
            } else {
                TorrentState::Downloading
            }
        }
        TorrentStatsState::Paused => TorrentState::Paused,
        TorrentStatsState::Error => TorrentState::Error,
    }
}

#[async_trait]
impl TorrentClient for LibrqbitClient {
    fn name(&self) -> &str {
        "librqbit"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        if !request.magnet.starts_with("magnet:") {
            return Err(TorrentClientError::InvalidTorrent(format!(
                "not a magnet link: {}",
                request.magnet
            )));
        }

        if let Some(ref folder) = request.output_folder {
            tokio::fs::create_dir_all(folder).await.map_err(|e| {
                TorrentClientError::Internal(format!(
                    "Failed to create output folder {}: {}",
                    folder.display(),
                    e
                ))
            })?;
        }

        // overwrite lets a restarted run reuse a partial payload
        let opts = AddTorrentOptions {
            output_folder: request
                .output_folder
                .as_ref()
                .map(|p| p.display().to_string()),
            overwrite: true,
            ..Default::default()
        };

        // DHT lookup can take forever for rare torrents
        let add_future = self
            .session
            .add_torrent(RqbitAddTorrent::from_url(&request.magnet), Some(opts));
        let response = tokio::time::timeout(self.metadata_timeout, add_future)
            .await
            .map_err(|_| TorrentClientError::MetadataTimeout(self.metadata_timeout.as_secs()))?
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to add torrent: {}", e)))?;

        let handle = match response {
            AddTorrentResponse::Added(_, handle) => handle,
            AddTorrentResponse::AlreadyManaged(_, handle) => {
                warn!(hash = %Self::format_hash(&handle.info_hash()), "Torrent already exists");
                handle
            }
            AddTorrentResponse::ListOnly(_) => {
                return Err(TorrentClientError::ApiError(
                    "Torrent was added in list-only mode".to_string(),
                ));
            }
        };

        let hash = Self::format_hash(&handle.info_hash());
        let name = handle.name().map(|s| s.to_string());

        if let Some(folder) = request.output_folder {
            self.folders.write().await.insert(hash.clone(), folder);
        }

        debug!(hash = %hash, name = ?name, "Torrent added successfully");
        Ok(AddTorrentResult { hash, name })
    }

    async fn get_torrent(&self, hash: &str) -> Result<TorrentInfo, TorrentClientError> {
        let torrent = self
            .find_torrent(hash)
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))?;

        Ok(self.torrent_to_info(&torrent).await)
    }

    async fn remove_torrent(
        &self,
        hash: &str,
        delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        let torrent = self
            .find_torrent(hash)
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))?;

        self.session
            .delete(torrent.id().into(), delete_files)
            .await
            .map_err(|e| {
                TorrentClientError::ApiError(format!("Failed to remove torrent: {}", e))
            })?;

        self.folders.write().await.remove(&hash.to_lowercase());

        debug!(hash = %hash, delete_files = delete_files, "Torrent removed");
        Ok(())
    }
}
