//! Pairing a torrent release with the subtitle whose file name shares the
//! most words with it.

use super::scorer::word_similarity;
use super::types::MatchError;
use crate::searcher::TorrentCandidate;
use crate::subtitles::SubtitleCandidate;

/// Anything that carries a release name to match subtitles against.
pub trait ReleaseName {
    fn release_name(&self) -> &str;
}

impl ReleaseName for TorrentCandidate {
    fn release_name(&self) -> &str {
        &self.name
    }
}

impl ReleaseName for String {
    fn release_name(&self) -> &str {
        self
    }
}

impl ReleaseName for &str {
    fn release_name(&self) -> &str {
        self
    }
}

/// Best pairing found by [`match_best`].
#[derive(Debug, Clone)]
pub struct MatchResult<'a, R> {
    pub release: &'a R,
    pub subtitle: &'a SubtitleCandidate,
    /// Word similarity of the pair; 0 when nothing overlapped or no
    /// subtitle had a file name.
    pub score: f64,
}

/// Exhaustively compare every release with every named subtitle.
///
/// The first pair `(releases[0], subtitles[0])` is the starting answer and
/// only a strictly better score replaces it. With no word overlap anywhere,
/// or no named subtitle at all, the first pair comes back with score 0.
pub fn match_best<'a, R: ReleaseName>(
    releases: &'a [R],
    subtitles: &'a [SubtitleCandidate],
) -> Result<MatchResult<'a, R>, MatchError> {
    if releases.is_empty() {
        return Err(MatchError::EmptyCandidateSet("releases"));
    }
    if subtitles.is_empty() {
        return Err(MatchError::EmptyCandidateSet("subtitles"));
    }

    let mut best = MatchResult {
        release: &releases[0],
        subtitle: &subtitles[0],
        score: -1.0,
    };

    for release in releases {
        for subtitle in subtitles {
            let Some(file_name) = subtitle.file_name.as_deref() else {
                continue;
            };
            let score = word_similarity(release.release_name(), file_name);
            if score > best.score {
                best = MatchResult {
                    release,
                    subtitle,
                    score,
                };
            }
        }
    }

    best.score = best.score.max(0.0);
    Ok(best)
}
