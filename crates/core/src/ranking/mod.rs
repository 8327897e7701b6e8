//! Release ranking and subtitle matching.
//!
//! Everything here is pure and synchronous: the pipeline hands in search
//! results and gets back an ordering or a pairing.
//!
//! - [`scorer`]: per-candidate scores under a [`ScoringPolicy`]
//! - [`Ranker`]: seeder filtering plus a stable descending sort
//! - [`match_best`]: best (release, subtitle) pair by shared words

mod matcher;
mod ranker;
pub mod scorer;
mod types;

pub use matcher::{match_best, MatchResult, ReleaseName};
pub use ranker::Ranker;
pub use scorer::{quality_tier, score, similarity, word_similarity};
pub use types::{MatchError, RankError, RankedCandidates, ScoredCandidate, ScoringPolicy};
