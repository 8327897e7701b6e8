//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// x264/AAC encoding settings shared by every job kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEncoding {
    pub crf: u8,
    pub preset: String,
    /// Downscale to at most this height, keeping aspect ratio.
    pub max_height: Option<u32>,
    pub audio_bitrate_kbps: u32,
}

impl Default for VideoEncoding {
    fn default() -> Self {
        Self {
            crf: 23,
            preset: "veryfast".to_string(),
            max_height: None,
            audio_bitrate_kbps: 128,
        }
    }
}

/// What a conversion job does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionKind {
    /// Render an SRT file into the video frames.
    BurnSubtitles {
        subtitle_path: PathBuf,
        /// ASS `force_style` override.
        style: Option<String>,
        encoding: VideoEncoding,
    },
    /// Re-encode to a smaller file suitable for chat delivery.
    Compress { encoding: VideoEncoding },
}

impl ConversionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionKind::BurnSubtitles { .. } => "burn_subtitles",
            ConversionKind::Compress { .. } => "compress",
        }
    }

    pub fn encoding(&self) -> &VideoEncoding {
        match self {
            ConversionKind::BurnSubtitles { encoding, .. } => encoding,
            ConversionKind::Compress { encoding } => encoding,
        }
    }
}

/// A single ffmpeg invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    pub job_id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub kind: ConversionKind,
}

impl ConversionJob {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>, kind: ConversionKind) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            input_path: input_path.into(),
            output_path: output_path.into(),
            kind,
        }
    }

    /// Where ffmpeg writes before the result is renamed into place:
    /// `movie.hebsub.mp4` becomes `movie.hebsub.tmp.mp4`.
    pub fn temp_output_path(&self) -> PathBuf {
        temp_path_for(&self.output_path)
    }
}

pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}.tmp.{}", stem, ext.to_string_lossy()),
        None => format!("{}.tmp", stem),
    };
    path.with_file_name(name)
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub job_id: String,
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    /// Wall-clock time in milliseconds.
    pub duration_ms: u64,
}

/// Media information from ffprobe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_secs: f64,
    /// Container format (e.g., "matroska", "mov").
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
}

/// Progress update during conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionProgress {
    pub job_id: String,
    /// Progress percentage (0.0 - 100.0).
    pub percent: f32,
    /// Current processing time in seconds.
    pub time_secs: f64,
    /// Estimated total duration in seconds.
    pub duration_secs: Option<f64>,
    /// Current processing speed (e.g., "1.5x").
    pub speed: Option<String>,
}
