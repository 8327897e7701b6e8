//! Episode acquisition pipeline.
//!
//! # Example
//!
//! ```ignore
//! use subgrab_core::pipeline::{EpisodeRequest, Pipeline};
//!
//! let pipeline = Pipeline::new(config, searcher, torrents, subtitles, converter, channel)
//!     .with_translator(translator);
//! let outcome = pipeline.run(&EpisodeRequest::new("Rick and Morty", 8, 5)).await?;
//! println!("{}", outcome.deliverable().display());
//! ```

mod error;
mod layout;
mod runner;
mod types;

pub use error::PipelineError;
pub use layout::{find_largest_media, is_media_file, sanitize_component, EpisodeLayout};
pub use runner::Pipeline;
pub use types::{EpisodeRequest, PipelineOutcome, Stage, StageStatus};
