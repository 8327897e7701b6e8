pub mod config;
pub mod converter;
pub mod notifier;
pub mod pipeline;
pub mod progress;
pub mod ranking;
pub mod searcher;
pub mod subtitles;
pub mod testing;
pub mod torrent_client;
pub mod translator;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use notifier::{build_notifier, Delivery, NotificationChannel};
pub use pipeline::{EpisodeRequest, Pipeline, PipelineError, PipelineOutcome, Stage, StageStatus};
pub use ranking::{match_best, Ranker, ScoringPolicy};
