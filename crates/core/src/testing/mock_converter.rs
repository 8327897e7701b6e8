//! Mock converter for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::converter::{
    ConversionJob, ConversionKind, ConversionProgress, ConversionResult, Converter,
    ConverterError, MediaInfo,
};

/// Mock implementation of the Converter trait.
///
/// Each conversion writes a small file at the job's output path and
/// records the job. Progress is reported at 25% steps when a sender is
/// supplied.
///
/// # Example
///
/// ```rust,ignore
/// let converter = MockConverter::new();
/// converter.fail_kind("compress").await;
///
/// let err = converter.convert(compress_job).await.unwrap_err();
/// assert_eq!(converter.recorded_jobs().await.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockConverter {
    jobs: Arc<RwLock<Vec<ConversionJob>>>,
    /// Job kinds (`ConversionKind::as_str`) that fail.
    failing_kinds: Arc<RwLock<Vec<String>>>,
}

impl MockConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every job submitted, including failed ones.
    pub async fn recorded_jobs(&self) -> Vec<ConversionJob> {
        self.jobs.read().await.clone()
    }

    /// Number of jobs of the given kind.
    pub async fn count_kind(&self, kind: &str) -> usize {
        self.jobs
            .read()
            .await
            .iter()
            .filter(|j| j.kind.as_str() == kind)
            .count()
    }

    /// Make jobs of this kind fail as if ffmpeg exited non-zero.
    pub async fn fail_kind(&self, kind: &str) {
        self.failing_kinds.write().await.push(kind.to_string());
    }

    async fn run(
        &self,
        job: ConversionJob,
        progress_tx: Option<mpsc::Sender<ConversionProgress>>,
    ) -> Result<ConversionResult, ConverterError> {
        self.jobs.write().await.push(job.clone());

        if !job.input_path.exists() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }
        if let ConversionKind::BurnSubtitles { subtitle_path, .. } = &job.kind {
            if !subtitle_path.exists() {
                return Err(ConverterError::InputNotFound {
                    path: subtitle_path.clone(),
                });
            }
        }
        if self
            .failing_kinds
            .read()
            .await
            .iter()
            .any(|k| k == job.kind.as_str())
        {
            return Err(ConverterError::failed(
                "ffmpeg exited with code 1",
                Some("mock failure".to_string()),
            ));
        }

        if let Some(tx) = progress_tx {
            for step in 1..=4 {
                let _ = tx
                    .send(ConversionProgress {
                        job_id: job.job_id.clone(),
                        percent: step as f32 * 25.0,
                        time_secs: step as f64 * 10.0,
                        duration_secs: Some(40.0),
                        speed: Some("2.0x".to_string()),
                    })
                    .await;
            }
        }

        let contents = format!("{}:{}", job.kind.as_str(), job.input_path.display());
        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&job.output_path, contents.as_bytes()).await?;

        Ok(ConversionResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes: contents.len() as u64,
            duration_ms: 0,
        })
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|_| ConverterError::InputNotFound {
                path: PathBuf::from(path),
            })?;
        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes: meta.len(),
            duration_secs: 40.0,
            format: "matroska".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(1920),
            video_height: Some(1080),
            audio_codec: Some("aac".to_string()),
        })
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        self.run(job, None).await
    }

    async fn convert_with_progress(
        &self,
        job: ConversionJob,
        progress_tx: mpsc::Sender<ConversionProgress>,
    ) -> Result<ConversionResult, ConverterError> {
        self.run(job, Some(progress_tx)).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}
