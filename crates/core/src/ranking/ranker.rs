//! Seeder filtering and ordering of a candidate batch.

use std::cmp::Ordering;

use super::scorer::score;
use super::types::{RankError, RankedCandidates, ScoredCandidate, ScoringPolicy};
use crate::searcher::TorrentCandidate;

/// Ranks one batch of torrent candidates under a single policy.
#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    policy: ScoringPolicy,
    min_seeders: u32,
}

impl Ranker {
    pub fn new(policy: ScoringPolicy, min_seeders: u32) -> Self {
        Self {
            policy,
            min_seeders,
        }
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    pub fn min_seeders(&self) -> u32 {
        self.min_seeders
    }

    /// Drop candidates under the seeder threshold, score the rest and sort
    /// them best first. Equal scores keep their input order.
    pub fn rank(
        &self,
        candidates: Vec<TorrentCandidate>,
        reference: &str,
    ) -> Result<RankedCandidates, RankError> {
        if candidates.is_empty() {
            return Err(RankError::NoCandidates);
        }

        let total = candidates.len();
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter(|c| c.seeders >= self.min_seeders)
            .map(|candidate| ScoredCandidate {
                score: score(self.policy, &candidate, reference),
                candidate,
            })
            .collect();

        if scored.is_empty() {
            return Err(RankError::ThresholdFilterEmpty {
                threshold: self.min_seeders,
                total,
            });
        }

        // sort_by is stable
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let kept = scored.len();
        Ok(RankedCandidates::new(
            self.policy,
            reference.to_string(),
            total - kept,
            scored,
        ))
    }
}
