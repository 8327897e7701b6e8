//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{
    ConversionJob, ConversionKind, ConversionProgress, ConversionResult, MediaInfo, VideoEncoding,
};

// ffmpeg reports out_time_ms in microseconds
static OUT_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"out_time_ms=(\d+)").expect("static regex is valid"));
static SPEED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"speed=\s*(\d+\.?\d*)x").expect("static regex is valid"));

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Builds the full ffmpeg argument list for a job writing to `output_path`.
    fn build_args(&self, job: &ConversionJob, output_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
        ];

        let encoding = job.kind.encoding();
        let mut filters = Vec::new();
        if let Some(height) = encoding.max_height {
            // Only shrink; -2 keeps the width even for x264
            filters.push(format!("scale=-2:'min({},ih)'", height));
        }
        if let ConversionKind::BurnSubtitles {
            subtitle_path,
            style,
            ..
        } = &job.kind
        {
            let mut filter = format!(
                "subtitles=filename='{}':charenc=UTF-8",
                escape_filter_path(subtitle_path)
            );
            let style = style.as_deref().unwrap_or(&self.config.subtitle_style);
            if !style.is_empty() {
                filter.push_str(&format!(":force_style='{}'", style));
            }
            filters.push(filter);
        }
        if !filters.is_empty() {
            args.extend(["-vf".to_string(), filters.join(",")]);
        }

        args.extend(encoding_args(encoding));

        // Drop embedded subtitle and data streams
        args.extend([
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "0:a:0?".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]);

        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]);

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        args.push(output_path.to_string_lossy().to_string());
        args
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, ConverterError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| ConverterError::Probe(format!("bad ffprobe output: {}", e)))?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");
        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
        })
    }

    /// Runs the conversion with optional progress reporting.
    ///
    /// ffmpeg writes into a `.tmp.` sibling which is renamed over the real
    /// output path only after a clean exit.
    async fn run_conversion(
        &self,
        job: &ConversionJob,
        progress_tx: Option<mpsc::Sender<ConversionProgress>>,
    ) -> Result<ConversionResult, ConverterError> {
        let start = Instant::now();

        if !job.input_path.exists() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|source| ConverterError::OutputDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let temp_path = job.temp_output_path();
        let duration_secs = self
            .probe(&job.input_path)
            .await
            .ok()
            .map(|i| i.duration_secs)
            .filter(|d| *d > 0.0);

        let args = self.build_args(job, &temp_path);
        debug!(job_id = %job.job_id, kind = job.kind.as_str(), ?args, "Running ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConverterError::spawn("ffmpeg", &self.config.ffmpeg_path, e))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConverterError::failed("ffmpeg stderr not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let mut current_time = 0.0;
        let mut current_speed = None;

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut last_progress_send = Instant::now();
            let progress_interval = Duration::from_millis(500);
            let mut error_output = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if line.contains("Error") || line.contains("error") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }

                if let Some(secs) = parse_out_time(&line) {
                    current_time = secs;
                }
                if let Some(speed) = parse_speed(&line) {
                    current_speed = Some(speed);
                }

                if let Some(ref tx) = progress_tx {
                    let finished = line.trim() == "progress=end";
                    if finished || last_progress_send.elapsed() >= progress_interval {
                        let percent = if finished {
                            100.0
                        } else {
                            duration_secs
                                .map(|dur| (current_time / dur * 100.0).min(100.0) as f32)
                                .unwrap_or(0.0)
                        };

                        // Non-blocking send
                        let _ = tx.try_send(ConversionProgress {
                            job_id: job.job_id.clone(),
                            percent,
                            time_secs: current_time,
                            duration_secs,
                            speed: current_speed.clone(),
                        });
                        last_progress_send = Instant::now();
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        let outcome = match result {
            Ok(Ok((status, _))) if status.success() => Ok(()),
            Ok(Ok((status, error_output))) => Err(ConverterError::failed(
                format!("ffmpeg exited with code {:?}", status.code()),
                (!error_output.is_empty()).then_some(error_output),
            )),
            Ok(Err(e)) => Err(ConverterError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        };

        if let Err(e) = outcome {
            if let Err(rm) = tokio::fs::remove_file(&temp_path).await {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %rm, "Failed to remove partial output");
                }
            }
            return Err(e);
        }

        let output_meta = tokio::fs::metadata(&temp_path)
            .await
            .map_err(|_| ConverterError::failed("Output file not created", None))?;
        tokio::fs::rename(&temp_path, &job.output_path).await?;

        Ok(ConversionResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn encoding_args(encoding: &VideoEncoding) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        encoding.preset.clone(),
        "-crf".to_string(),
        encoding.crf.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        format!("{}k", encoding.audio_bitrate_kbps),
    ]
}

/// Escape a path for use inside a quoted filtergraph option.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace('\'', "'\\\\\\''")
        .replace(':', "\\:")
}

fn parse_out_time(line: &str) -> Option<f64> {
    let caps = OUT_TIME.captures(line)?;
    let micros: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(micros / 1_000_000.0)
}

fn parse_speed(line: &str) -> Option<String> {
    let caps = SPEED.captures(line)?;
    Some(format!("{}x", caps.get(1)?.as_str()))
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        if !path.exists() {
            return Err(ConverterError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| ConverterError::spawn("ffprobe", &self.config.ffprobe_path, e))?;

        if !output.status.success() {
            return Err(ConverterError::Probe(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        self.run_conversion(&job, None).await
    }

    async fn convert_with_progress(
        &self,
        job: ConversionJob,
        progress_tx: mpsc::Sender<ConversionProgress>,
    ) -> Result<ConversionResult, ConverterError> {
        self.run_conversion(&job, Some(progress_tx)).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        for (tool, path) in [
            ("ffmpeg", &self.config.ffmpeg_path),
            ("ffprobe", &self.config.ffprobe_path),
        ] {
            Command::new(path)
                .arg("-version")
                .output()
                .await
                .map_err(|e| ConverterError::spawn(tool, path, e))?;
        }
        Ok(())
    }
}
