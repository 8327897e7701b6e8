//! Top-level error taxonomy for a pipeline run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::converter::ConverterError;
use crate::notifier::NotifyError;
use crate::ranking::{MatchError, RankError};
use crate::searcher::SearchError;
use crate::subtitles::SubtitleError;
use crate::torrent_client::TorrentClientError;
use crate::translator::TranslateError;

/// Every failure that aborts a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Nothing to work with: no torrents, no payload video, or no
    /// subtitles in any attempted language.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{total} candidates found, none with at least {threshold} seeders")]
    ThresholdFilterEmpty { threshold: u32, total: usize },

    #[error("Provider authentication failed: {0}")]
    ProviderAuth(String),

    /// Search, download, torrent or fetch failure.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// ffmpeg failed or timed out.
    #[error("Subprocess failed: {0}")]
    Subprocess(String),

    #[error("Empty candidate set: {0}")]
    EmptyCandidateSet(&'static str),

    #[error("No candidates to rank")]
    NoCandidates,

    #[error("Translation failed: {0}")]
    Translation(#[from] TranslateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Short machine-readable category for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::NotFound(_) => "not_found",
            PipelineError::ThresholdFilterEmpty { .. } => "threshold_filter_empty",
            PipelineError::ProviderAuth(_) => "provider_auth",
            PipelineError::Transfer(_) => "transfer",
            PipelineError::Subprocess(_) => "subprocess",
            PipelineError::EmptyCandidateSet(_) => "empty_candidate_set",
            PipelineError::NoCandidates => "no_candidates",
            PipelineError::Translation(_) => "translation",
            PipelineError::Io(_) => "io",
            PipelineError::Config(_) => "config",
        }
    }
}

impl From<RankError> for PipelineError {
    fn from(e: RankError) -> Self {
        match e {
            RankError::NoCandidates => PipelineError::NoCandidates,
            RankError::ThresholdFilterEmpty { threshold, total } => {
                PipelineError::ThresholdFilterEmpty { threshold, total }
            }
        }
    }
}

impl From<MatchError> for PipelineError {
    fn from(e: MatchError) -> Self {
        match e {
            MatchError::EmptyCandidateSet(which) => PipelineError::EmptyCandidateSet(which),
        }
    }
}

impl From<SearchError> for PipelineError {
    fn from(e: SearchError) -> Self {
        PipelineError::Transfer(e.to_string())
    }
}

impl From<TorrentClientError> for PipelineError {
    fn from(e: TorrentClientError) -> Self {
        PipelineError::Transfer(e.to_string())
    }
}

impl From<SubtitleError> for PipelineError {
    fn from(e: SubtitleError) -> Self {
        match e {
            SubtitleError::AuthFailed(msg) => PipelineError::ProviderAuth(msg),
            SubtitleError::NotLoggedIn => PipelineError::ProviderAuth("not logged in".to_string()),
            other => PipelineError::Transfer(other.to_string()),
        }
    }
}

impl From<ConverterError> for PipelineError {
    fn from(e: ConverterError) -> Self {
        match e {
            ConverterError::Io(io) => PipelineError::Io(io),
            other => PipelineError::Subprocess(other.to_string()),
        }
    }
}

impl From<NotifyError> for PipelineError {
    fn from(e: NotifyError) -> Self {
        match e {
            NotifyError::AuthFailed(msg) => PipelineError::ProviderAuth(msg),
            NotifyError::NotConfigured(msg) => {
                PipelineError::Config(ConfigError::ValidationError(msg))
            }
            NotifyError::Io(io) => PipelineError::Io(io),
            other => PipelineError::Transfer(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_errors_keep_their_meaning() {
        let err: PipelineError = RankError::ThresholdFilterEmpty {
            threshold: 20,
            total: 3,
        }
        .into();
        assert!(matches!(
            err,
            PipelineError::ThresholdFilterEmpty {
                threshold: 20,
                total: 3
            }
        ));
        assert_eq!(err.kind(), "threshold_filter_empty");

        let err: PipelineError = RankError::NoCandidates.into();
        assert!(matches!(err, PipelineError::NoCandidates));
    }

    #[test]
    fn test_subtitle_auth_maps_to_provider_auth() {
        let err: PipelineError = SubtitleError::AuthFailed("bad key".into()).into();
        assert!(matches!(err, PipelineError::ProviderAuth(ref m) if m == "bad key"));

        let err: PipelineError = SubtitleError::RateLimited.into();
        assert_eq!(err.kind(), "transfer");
    }

    #[test]
    fn test_converter_failure_maps_to_subprocess() {
        let err: PipelineError =
            ConverterError::failed("ffmpeg exited with code 1", None).into();
        assert_eq!(err.kind(), "subprocess");
        assert_eq!(err.to_string(), "Subprocess failed: Conversion failed: ffmpeg exited with code 1");
    }
}
