//! Progress tracking shared by the download and conversion stages.

mod format;
mod reporter;

pub use format::{format_bytes, format_duration, format_percent, format_progress};
pub(crate) use format::fraction_to_percent;
pub use reporter::{ProgressEvent, ProgressReporter};
