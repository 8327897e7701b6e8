//! Per-candidate scoring.
//!
//! Both policies put the primary signal in the thousands and add
//! `seeders / 1000` on top. Under [`ScoringPolicy::QualityTier`] this means a
//! 720p release only beats a 1080p one once its seeder count exceeds the
//! 1080p release's by 1,000,000 or more.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashSet;

use super::types::ScoringPolicy;
use crate::searcher::TorrentCandidate;

/// Resolution tags in priority order, with their tier.
const QUALITY_TIERS: &[(&str, u32)] = &[("1080p", 3), ("720p", 2), ("480p", 1)];

static NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex is valid"));

/// Score a candidate under the given policy.
///
/// `reference` is only read by [`ScoringPolicy::Similarity`].
pub fn score(policy: ScoringPolicy, candidate: &TorrentCandidate, reference: &str) -> f64 {
    let primary = match policy {
        ScoringPolicy::QualityTier => quality_tier(&candidate.name) as f64,
        ScoringPolicy::Similarity => similarity(&candidate.name, reference),
    };
    primary * 1000.0 + candidate.seeders as f64 / 1000.0
}

/// Resolution tier detected in a release name: 3 for 1080p, 2 for 720p,
/// 1 for 480p, 0 otherwise. First match in that order wins.
pub fn quality_tier(name: &str) -> u32 {
    let lower = name.to_lowercase();
    QUALITY_TIERS
        .iter()
        .find(|(tag, _)| lower.contains(tag))
        .map(|(_, tier)| *tier)
        .unwrap_or(0)
}

/// Positional character similarity in `[0, 1]`.
///
/// Both inputs are lower-cased and reduced to `[a-z0-9]`. The result is the
/// number of indices holding the same character in both strings divided by
/// the longer length. Shifted or inserted characters are not recognised;
/// two empty strings give 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize_compact(a);
    let b = normalize_compact(b);
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    let matches = a
        .bytes()
        .zip(b.bytes())
        .filter(|(x, y)| x == y)
        .count();
    matches as f64 / longest as f64
}

/// Token overlap in `[0, 1]`: shared distinct words over the larger word set.
pub fn word_similarity(a: &str, b: &str) -> f64 {
    let left = tokens(a);
    let right = tokens(b);
    let shared = left.intersection(&right).count();
    let denom = left.len().max(right.len()).max(1);
    shared as f64 / denom as f64
}

fn normalize_compact(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

fn tokens(s: &str) -> HashSet<String> {
    let lower = s.to_lowercase();
    NON_ALNUM
        .replace_all(&lower, " ")
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, seeders: u32) -> TorrentCandidate {
        TorrentCandidate {
            name: name.to_string(),
            seeders,
            ..Default::default()
        }
    }

    #[test]
    fn test_quality_tier_detection() {
        assert_eq!(quality_tier("Show.S01E01.1080p.WEB"), 3);
        assert_eq!(quality_tier("Show.S01E01.720P.HDTV"), 2);
        assert_eq!(quality_tier("show s01e01 480p"), 1);
        assert_eq!(quality_tier("Show.S01E01.HDTV"), 0);
        // Priority order, not position in the name
        assert_eq!(quality_tier("720p-to-1080p upscale"), 3);
    }

    #[test]
    fn test_quality_score_formula() {
        let c = candidate("Show.S01E01.720p", 1500);
        let s = score(ScoringPolicy::QualityTier, &c, "ignored");
        assert!((s - 2001.5).abs() < 1e-9);
    }

    #[test]
    fn test_1080p_beats_720p_below_crossover() {
        let hd = candidate("Show.1080p", 0);
        let sd = candidate("Show.720p", 999_999);
        assert!(
            score(ScoringPolicy::QualityTier, &hd, "") > score(ScoringPolicy::QualityTier, &sd, "")
        );

        let sd_flood = candidate("Show.720p", 1_000_001);
        assert!(
            score(ScoringPolicy::QualityTier, &sd_flood, "")
                > score(ScoringPolicy::QualityTier, &hd, "")
        );
    }

    #[test]
    fn test_similarity_identical_is_one() {
        assert_eq!(similarity("S08E05.1080p.WEB", "S08E05.1080p.WEB"), 1.0);
    }

    #[test]
    fn test_similarity_disjoint_is_zero() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_similarity_empty_inputs() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("...", "--"), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_similarity_is_positional() {
        // Same letters shifted by one position share nothing
        assert_eq!(similarity("abcd", "xabcd"), 0.0);
        // Separators and case are ignored before comparing
        assert_eq!(similarity("Rick.And.Morty", "rick and morty"), 1.0);
        assert_eq!(similarity("abcd", "abxy"), 0.5);
    }

    #[test]
    fn test_similarity_score_uses_reference() {
        let c = candidate("Rick and Morty S08E05", 2000);
        let s = score(ScoringPolicy::Similarity, &c, "Rick and Morty S08E05");
        assert!((s - 1002.0).abs() < 1e-9);
    }

    #[test]
    fn test_word_similarity_shared_tokens() {
        let s = word_similarity("Rick and Morty S08E05 1080p", "Rick.and.Morty.S08E05.WEB");
        // rick, and, morty, s08e05 shared; both sets have 5 tokens
        assert!((s - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_word_similarity_denominator_is_larger_set() {
        // Jaccard would give 1/3 here
        assert_eq!(word_similarity("a b", "b c"), 0.5);
        assert_eq!(word_similarity("a", "a b c d"), 0.25);
    }

    #[test]
    fn test_word_similarity_edge_cases() {
        assert_eq!(word_similarity("", ""), 0.0);
        assert_eq!(word_similarity("x x x", "X"), 1.0);
        assert_eq!(word_similarity("foo", "bar"), 0.0);
    }
}
