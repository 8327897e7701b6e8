//! Torrent client abstraction.
//!
//! The pipeline only needs to add a magnet into a given folder, poll it
//! and drop it once the payload has been moved out.

mod librqbit;
mod magnet;
mod types;

pub use librqbit::LibrqbitClient;
pub use magnet::build_magnet;
pub use types::*;
