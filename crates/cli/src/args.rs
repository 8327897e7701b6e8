//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use subgrab_core::{
    config::NotifierBackend, pipeline::EpisodeRequest, Config, ScoringPolicy,
};

/// Fetch an episode, give it subtitles and send it to chat.
#[derive(Parser, Debug)]
#[command(name = "subgrab")]
#[command(version)]
pub struct Args {
    /// Show name, as used in release titles
    #[arg(long)]
    pub show: String,

    /// Season number
    #[arg(long)]
    pub season: u32,

    /// Episode number
    #[arg(long)]
    pub episode: u32,

    /// Output root; the episode goes to <out>/<show>/SxxEyy [default: .]
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Minimum seeders for a torrent to be considered [default: 20]
    #[arg(long)]
    pub min_seeds: Option<u32>,

    /// TOML configuration file
    #[arg(long, env = "SUBGRAB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Torrent ranking policy (quality-tier or similarity)
    #[arg(long)]
    pub policy: Option<ScoringPolicy>,

    /// Skip the chat-friendly re-encode
    #[arg(long)]
    pub no_compress: bool,

    /// Do not send chat notifications
    #[arg(long)]
    pub no_notify: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl Args {
    pub fn request(&self) -> EpisodeRequest {
        EpisodeRequest::new(self.show.trim(), self.season, self.episode)
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(out) = &self.out {
            config.pipeline.output_dir = out.clone();
        }
        if let Some(min_seeds) = self.min_seeds {
            config.ranking.min_seeds = min_seeds;
        }
        if let Some(policy) = self.policy {
            config.ranking.policy = policy;
        }
        if self.no_compress {
            config.compress.enabled = false;
        }
        if self.no_notify {
            config.notifier.backend = NotifierBackend::None;
        }
    }
}
