//! Types for pipeline runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::notifier::Delivery;

/// One episode to acquire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRequest {
    pub show: String,
    pub season: u32,
    pub episode: u32,
}

impl EpisodeRequest {
    pub fn new(show: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            show: show.into(),
            season,
            episode,
        }
    }

    /// `S01E02`.
    pub fn code(&self) -> String {
        format!("S{:02}E{:02}", self.season, self.episode)
    }

    /// Free-text index query, also the reference string for similarity ranking.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.show.trim(), self.code())
    }
}

impl fmt::Display for EpisodeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.search_query())
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Download,
    Subtitle,
    Mux,
    Compress,
    Notify,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::Subtitle => "subtitle",
            Stage::Mux => "mux",
            Stage::Compress => "compress",
            Stage::Notify => "notify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Ran,
    /// Output already present in the episode directory.
    Skipped,
    /// Turned off by configuration.
    Disabled,
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub episode_dir: PathBuf,
    /// Downloaded video. `None` when the run resumed from a muxed file
    /// whose source was already removed.
    pub source_video: Option<PathBuf>,
    pub subtitle: Option<PathBuf>,
    pub muxed: PathBuf,
    pub compressed: Option<PathBuf>,
    /// Name of the torrent downloaded during this run.
    pub torrent_name: Option<String>,
    pub notified: Option<Delivery>,
    pub stages: Vec<(Stage, StageStatus)>,
}

impl PipelineOutcome {
    pub fn status(&self, stage: Stage) -> Option<StageStatus> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, status)| *status)
    }

    /// The file handed to the chat backend: compressed if available.
    pub fn deliverable(&self) -> &Path {
        self.compressed.as_deref().unwrap_or(&self.muxed)
    }
}
