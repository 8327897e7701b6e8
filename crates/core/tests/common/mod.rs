//! Shared harness for pipeline integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use subgrab_core::{
    notifier::NotificationChannel,
    pipeline::{EpisodeRequest, Pipeline},
    testing::{
        fixtures, MockConverter, MockNotifier, MockSearcher, MockSubtitleProvider,
        MockTorrentClient, MockTranslator,
    },
    Config,
};

pub const SHOW: &str = "Rick and Morty";
pub const BEST_RELEASE: &str = "Rick.and.Morty.S08E05.1080p.WEB";
pub const BEST_HASH: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

/// Mocks for every collaborator plus a temporary output directory.
pub struct TestHarness {
    pub searcher: Arc<MockSearcher>,
    pub torrents: Arc<MockTorrentClient>,
    pub subtitles: Arc<MockSubtitleProvider>,
    pub translator: Arc<MockTranslator>,
    pub converter: Arc<MockConverter>,
    pub notifier: Arc<MockNotifier>,
    pub channel: Arc<NotificationChannel>,
    pub config: Config,
    pub out_dir: TempDir,
}

impl TestHarness {
    pub async fn new() -> Self {
        let out_dir = TempDir::new().expect("Failed to create temp dir");
        let config = fixtures::test_config(out_dir.path());

        let notifier = Arc::new(MockNotifier::new());
        let channel = Arc::new(NotificationChannel::new(
            notifier.clone(),
            &config.notifier,
        ));
        channel.connect().await.expect("Failed to connect channel");

        Self {
            searcher: Arc::new(MockSearcher::new()),
            torrents: Arc::new(MockTorrentClient::new()),
            subtitles: Arc::new(MockSubtitleProvider::new()),
            translator: Arc::new(MockTranslator::new()),
            converter: Arc::new(MockConverter::new()),
            notifier,
            channel,
            config,
            out_dir,
        }
    }

    /// A harness whose index, swarm and subtitle provider all have what a
    /// run needs.
    pub async fn seeded() -> Self {
        let harness = Self::new().await;
        harness.seed_search().await;
        harness.seed_target_subtitles().await;
        harness
    }

    pub async fn seed_search(&self) {
        self.searcher
            .set_results(vec![
                fixtures::torrent_candidate(
                    "Rick.and.Morty.S08E05.720p.WEB",
                    "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                    50,
                ),
                fixtures::torrent_candidate(BEST_RELEASE, BEST_HASH, 30),
                fixtures::torrent_candidate(
                    "Rick.and.Morty.S08E05.2160p.WEB",
                    "cccccccccccccccccccccccccccccccccccccccc",
                    2,
                ),
            ])
            .await;
    }

    pub async fn seed_target_subtitles(&self) {
        self.subtitles
            .set_results(
                "he",
                vec![
                    fixtures::subtitle_candidate(1, "Other.Show.S01E01.srt", "he"),
                    fixtures::subtitle_candidate(2, "Rick.and.Morty.S08E05.1080p.WEB-GRP.srt", "he"),
                ],
            )
            .await;
        self.subtitles.set_file(1, "not a subtitle").await;
        self.subtitles.set_file(2, fixtures::SAMPLE_SRT).await;
    }

    pub fn request(&self) -> EpisodeRequest {
        EpisodeRequest::new(SHOW, 8, 5)
    }

    pub fn episode_dir(&self) -> PathBuf {
        self.out_dir.path().join(SHOW).join("S08E05")
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline_with_converter(self.converter.clone())
    }

    pub fn pipeline_with_converter(&self, converter: Arc<MockConverter>) -> Pipeline {
        Pipeline::new(
            self.config.clone(),
            self.searcher.clone(),
            self.torrents.clone(),
            self.subtitles.clone(),
            converter,
            self.channel.clone(),
        )
        .with_translator(self.translator.clone())
    }

    /// Put a file into the episode directory.
    pub fn place(&self, name: &str, bytes: usize) -> PathBuf {
        let dir = self.episode_dir();
        std::fs::create_dir_all(&dir).expect("Failed to create episode dir");
        let path = dir.join(name);
        std::fs::write(&path, vec![0u8; bytes]).expect("Failed to write file");
        path
    }

    /// File names directly inside the episode directory, sorted.
    pub fn episode_files(&self) -> Vec<String> {
        list_names(&self.episode_dir())
    }
}

pub fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
