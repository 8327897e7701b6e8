use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use super::error::ConverterError;
use super::types::{ConversionJob, ConversionProgress, ConversionResult, MediaInfo};

/// Burns subtitles into and re-encodes episode videos.
///
/// Implementations write to a temporary sibling of `job.output_path` and
/// rename it into place on success, so a file at the output path is always
/// complete.
#[async_trait]
pub trait Converter: Send + Sync {
    fn name(&self) -> &str;

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError>;

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError>;

    /// Like [`Converter::convert`], reporting progress on `progress_tx`.
    /// Updates are dropped rather than awaited when the receiver lags or is gone.
    async fn convert_with_progress(
        &self,
        job: ConversionJob,
        progress_tx: mpsc::Sender<ConversionProgress>,
    ) -> Result<ConversionResult, ConverterError>;

    /// Check that the configured binaries can be run.
    async fn validate(&self) -> Result<(), ConverterError>;
}
