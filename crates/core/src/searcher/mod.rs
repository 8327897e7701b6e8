//! Torrent search abstraction.
//!
//! A `Searcher` turns a free-text query into a list of candidates. The
//! production backend queries an apibay-style JSON index across several
//! categories concurrently and merges the answers by info hash.

mod apibay;
mod dedup;
mod types;

pub use apibay::ApibaySearcher;
pub use dedup::deduplicate_results;
pub use types::*;
