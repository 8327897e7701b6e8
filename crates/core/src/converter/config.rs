
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ffmpeg binaries and the encode settings for the subtitle burn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// A job still running after this many seconds is killed.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Passed to `-loglevel`.
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Appended right before the output path.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,

    /// x264 CRF used when burning subtitles into the video.
    #[serde(default = "default_burn_crf")]
    pub burn_crf: u8,

    /// x264 preset used when burning subtitles.
    #[serde(default = "default_preset")]
    pub burn_preset: String,

    /// ASS `force_style` applied to burned subtitles.
    #[serde(default = "default_subtitle_style")]
    pub subtitle_style: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_timeout() -> u64 {
    3 * 3600
}

fn default_log_level() -> String {
    "warning".to_string()
}

fn default_burn_crf() -> u8 {
    20
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_subtitle_style() -> String {
    "FontName=Arial,FontSize=22,Outline=1".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_timeout(),
            ffmpeg_log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
            burn_crf: default_burn_crf(),
            burn_preset: default_preset(),
            subtitle_style: default_subtitle_style(),
        }
    }
}
