//! Testing utilities and mock implementations.
//!
//! Every external collaborator of the pipeline has a mock here, so a full
//! episode run can be exercised against a temporary directory without a
//! network, a torrent swarm or an ffmpeg binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use subgrab_core::testing::{fixtures, MockSearcher, MockTorrentClient};
//!
//! let searcher = MockSearcher::new();
//! searcher
//!     .set_results(vec![fixtures::torrent_candidate("Show.S01E02.1080p", "aa", 40)])
//!     .await;
//!
//! let torrents = MockTorrentClient::new();
//! torrents.set_progress_steps(vec![0.5, 1.0]).await;
//! ```

mod mock_converter;
mod mock_notifier;
mod mock_searcher;
mod mock_subtitles;
mod mock_torrent_client;
mod mock_translator;

pub use mock_converter::MockConverter;
pub use mock_notifier::{MockNotifier, SentMessage};
pub use mock_searcher::MockSearcher;
pub use mock_subtitles::MockSubtitleProvider;
pub use mock_torrent_client::{MockTorrentClient, MOCK_PAYLOAD_BYTES};
pub use mock_translator::MockTranslator;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::config::Config;
    use crate::searcher::TorrentCandidate;
    use crate::subtitles::SubtitleCandidate;

    /// A three-cue subtitle file.
    pub const SAMPLE_SRT: &str = "1\n00:00:01,000 --> 00:00:03,500\nWhere were you last night?\n\n2\n00:00:04,000 --> 00:00:05,250\nOut.\n\n3\n00:00:06,000 --> 00:00:08,000\nOut where?\n- Just out.\n";

    /// Create a test torrent candidate with reasonable defaults.
    pub fn torrent_candidate(name: &str, info_hash: &str, seeders: u32) -> TorrentCandidate {
        TorrentCandidate {
            name: name.to_string(),
            info_hash: info_hash.to_string(),
            seeders,
            leechers: seeders / 4,
            size_bytes: 1024 * 1024 * 700,
            category: Some("205".to_string()),
            publish_date: None,
        }
    }

    /// Create a named subtitle candidate.
    pub fn subtitle_candidate(file_id: u64, file_name: &str, language: &str) -> SubtitleCandidate {
        SubtitleCandidate {
            file_id,
            file_name: Some(file_name.to_string()),
            release: None,
            language: language.to_string(),
            download_count: 100,
        }
    }

    /// Configuration for an offline run rooted at `output_dir`.
    ///
    /// Polling is fast, the stall timeout is one second and compression is on.
    pub fn test_config(output_dir: &Path) -> Config {
        let mut config = Config::default();
        config.pipeline.output_dir = output_dir.to_path_buf();
        config.pipeline.download_poll_interval_ms = 5;
        config.pipeline.stall_timeout_secs = 1;
        config.ranking.min_seeds = 5;
        config.notifier.retry_backoff_ms = 1;
        config.notifier.failure_grace_ms = 0;
        config
    }
}
