//! Subtitle search and retrieval.

mod opensubtitles;
pub mod srt;
mod types;

pub use opensubtitles::OpenSubtitlesClient;
pub use types::*;
