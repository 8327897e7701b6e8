//! Converter module for burning subtitles and compressing episodes.
//!
//! # Example
//!
//! ```ignore
//! use subgrab_core::converter::{Converter, ConversionJob, ConversionKind, FfmpegConverter, VideoEncoding};
//!
//! let converter = FfmpegConverter::with_defaults();
//! converter.validate().await?;
//!
//! let job = ConversionJob::new(
//!     "/out/Show/S01E02/Show.S01E02.mkv",
//!     "/out/Show/S01E02/Show.S01E02.hebsub.mp4",
//!     ConversionKind::BurnSubtitles {
//!         subtitle_path: "/out/Show/S01E02/Show.S01E02.heb.srt".into(),
//!         style: None,
//!         encoding: VideoEncoding::default(),
//!     },
//! );
//! let result = converter.convert(job).await?;
//! println!("Converted in {} ms", result.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::Converter;
pub use types::{
    ConversionJob, ConversionKind, ConversionProgress, ConversionResult, MediaInfo, VideoEncoding,
};
pub(crate) use types::temp_path_for;
