//! Types for the ranking module.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::searcher::TorrentCandidate;

/// How a batch of torrent candidates is scored.
///
/// Both policies add `seeders / 1000` as a tie-break on top of a primary
/// term worth up to a few thousand points. Scores are only comparable
/// within one batch scored under one policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Resolution tier (1080p > 720p > 480p > none) times 1000.
    #[default]
    QualityTier,
    /// Positional character similarity to the search query times 1000.
    Similarity,
}

impl ScoringPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringPolicy::QualityTier => "quality_tier",
            ScoringPolicy::Similarity => "similarity",
        }
    }
}

impl std::fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "quality_tier" | "quality" => Ok(ScoringPolicy::QualityTier),
            "similarity" => Ok(ScoringPolicy::Similarity),
            other => Err(format!("unknown scoring policy: {}", other)),
        }
    }
}

/// A candidate together with the score it got in its batch.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub candidate: TorrentCandidate,
    pub score: f64,
}

/// Output of one ranking pass, best first.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidates {
    /// Policy every score in this batch was computed with.
    pub policy: ScoringPolicy,
    /// Reference string used by the similarity policy.
    pub reference: String,
    /// Candidates dropped by the seeder threshold.
    pub filtered_out: usize,
    candidates: Vec<ScoredCandidate>,
}

impl RankedCandidates {
    pub(crate) fn new(
        policy: ScoringPolicy,
        reference: String,
        filtered_out: usize,
        candidates: Vec<ScoredCandidate>,
    ) -> Self {
        Self {
            policy,
            reference,
            filtered_out,
            candidates,
        }
    }

    /// The top candidate. A ranked batch is never empty.
    pub fn best(&self) -> &ScoredCandidate {
        &self.candidates[0]
    }

    pub fn candidates(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Emit every candidate with its score at debug level.
    pub fn log_dump(&self) {
        debug!(
            policy = %self.policy,
            reference = %self.reference,
            kept = self.candidates.len(),
            filtered_out = self.filtered_out,
            "Ranked torrent candidates"
        );
        for (idx, scored) in self.candidates.iter().enumerate() {
            debug!(
                rank = idx + 1,
                score = scored.score,
                seeders = scored.candidate.seeders,
                name = %scored.candidate.name,
                "candidate"
            );
        }
    }
}

/// Errors raised by the ranker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankError {
    /// Nothing to rank at all.
    #[error("no candidates to rank")]
    NoCandidates,

    /// Candidates existed but all fell below the seeder threshold.
    #[error("none of {total} candidates has at least {threshold} seeders")]
    ThresholdFilterEmpty { threshold: u32, total: usize },
}

/// Errors raised by the cross-collection matcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("cannot match against an empty candidate set ({0})")]
    EmptyCandidateSet(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!("quality_tier".parse(), Ok(ScoringPolicy::QualityTier));
        assert_eq!("Quality-Tier".parse(), Ok(ScoringPolicy::QualityTier));
        assert_eq!("similarity".parse(), Ok(ScoringPolicy::Similarity));
        assert!("best".parse::<ScoringPolicy>().is_err());
    }

    #[test]
    fn test_policy_serialization() {
        assert_eq!(
            serde_json::to_string(&ScoringPolicy::QualityTier).unwrap(),
            "\"quality_tier\""
        );
        assert_eq!(ScoringPolicy::Similarity.to_string(), "similarity");
    }
}
