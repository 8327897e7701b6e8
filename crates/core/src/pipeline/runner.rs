//! Drives one episode through search, download, subtitles, mux, compress
//! and notify.
//!
//! Stages run strictly one after another. Each stage first looks for its
//! output in the episode directory and is skipped when it finds one, so a
//! rerun after a failure picks up where the last run stopped.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::fs;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::error::PipelineError;
use super::layout::{find_largest_media, move_file, write_atomic, EpisodeLayout};
use super::types::{EpisodeRequest, PipelineOutcome, Stage, StageStatus};
use crate::config::Config;
use crate::converter::{
    ConversionJob, ConversionKind, ConversionProgress, Converter, VideoEncoding,
};
use crate::notifier::NotificationChannel;
use crate::progress::{format_bytes, format_duration, format_progress, ProgressReporter};
use crate::ranking::{match_best, Ranker};
use crate::searcher::{SearchQuery, Searcher};
use crate::subtitles::{srt, SubtitleCandidate, SubtitleProvider, SubtitleSearch};
use crate::torrent_client::{build_magnet, AddTorrentRequest, TorrentClient, TorrentState};
use crate::translator::{translate_subtitles, Translator};

/// Audio bitrate when burning subtitles; the compress stage has its own.
const BURN_AUDIO_BITRATE_KBPS: u32 = 192;

/// The acquisition pipeline with its collaborators.
pub struct Pipeline {
    config: Config,
    searcher: Arc<dyn Searcher>,
    torrents: Arc<dyn TorrentClient>,
    subtitles: Arc<dyn SubtitleProvider>,
    translator: Option<Arc<dyn Translator>>,
    converter: Arc<dyn Converter>,
    notifications: Arc<NotificationChannel>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        searcher: Arc<dyn Searcher>,
        torrents: Arc<dyn TorrentClient>,
        subtitles: Arc<dyn SubtitleProvider>,
        converter: Arc<dyn Converter>,
        notifications: Arc<NotificationChannel>,
    ) -> Self {
        Self {
            config,
            searcher,
            torrents,
            subtitles,
            translator: None,
            converter,
            notifications,
        }
    }

    /// Enable translation of subtitles found only in a fallback language.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self, request: &EpisodeRequest) -> EpisodeLayout {
        EpisodeLayout::new(
            &self.config.pipeline.output_dir,
            request,
            &self.config.subtitles.tag,
        )
    }

    /// Run every stage for one episode.
    pub async fn run(&self, request: &EpisodeRequest) -> Result<PipelineOutcome, PipelineError> {
        let started = Instant::now();
        let layout = self.layout(request);
        fs::create_dir_all(layout.dir()).await?;

        info!(
            episode = %request,
            dir = %layout.dir().display(),
            "Starting pipeline run"
        );
        self.notifications
            .send_text(format!("Starting {}", request))
            .await;

        let mut stages = Vec::new();
        let mut torrent_name = None;
        let mut source_video = layout.find_source_video().await?;
        let mut subtitle = layout.find_subtitle().await?;

        let muxed = match layout.find_muxed().await? {
            Some(existing) => {
                info!(
                    path = %existing.display(),
                    "Subtitled video present, skipping download, subtitle and mux"
                );
                stages.push((Stage::Download, StageStatus::Skipped));
                stages.push((Stage::Subtitle, StageStatus::Skipped));
                stages.push((Stage::Mux, StageStatus::Skipped));
                existing
            }
            None => {
                let video = match source_video.take() {
                    Some(existing) => {
                        info!(path = %existing.display(), "Source video present, skipping download");
                        stages.push((Stage::Download, StageStatus::Skipped));
                        existing
                    }
                    None => {
                        let (video, name) = self.download(request, &layout).await?;
                        torrent_name = Some(name);
                        stages.push((Stage::Download, StageStatus::Ran));
                        video
                    }
                };

                let srt_path = match subtitle.take() {
                    Some(existing) => {
                        info!(path = %existing.display(), "Subtitle present, skipping subtitle search");
                        stages.push((Stage::Subtitle, StageStatus::Skipped));
                        existing
                    }
                    None => {
                        let path = self
                            .fetch_subtitle(request, &layout, &video, torrent_name.as_deref())
                            .await?;
                        stages.push((Stage::Subtitle, StageStatus::Ran));
                        path
                    }
                };

                let muxed = self.burn_subtitles(&layout, &video, &srt_path).await?;
                stages.push((Stage::Mux, StageStatus::Ran));

                source_video = Some(video);
                subtitle = Some(srt_path);
                muxed
            }
        };

        let compressed = if !self.config.compress.enabled {
            stages.push((Stage::Compress, StageStatus::Disabled));
            None
        } else if let Some(existing) = layout.find_compressed().await? {
            info!(path = %existing.display(), "Compressed video present, skipping compress");
            stages.push((Stage::Compress, StageStatus::Skipped));
            Some(existing)
        } else {
            let path = self.compress(&layout, &muxed).await?;
            stages.push((Stage::Compress, StageStatus::Ran));
            Some(path)
        };

        let notified = if self.notifications.is_enabled() {
            let deliverable = compressed.as_deref().unwrap_or(&muxed);
            let caption = format!(
                "{} ({} subtitles)",
                request, self.config.subtitles.language_name
            );
            let delivery = self.notifications.send_video(deliverable, caption).await;
            stages.push((Stage::Notify, StageStatus::Ran));
            Some(delivery)
        } else {
            stages.push((Stage::Notify, StageStatus::Disabled));
            None
        };

        info!(
            episode = %request,
            elapsed = %format_duration(started.elapsed()),
            output = %compressed.as_deref().unwrap_or(&muxed).display(),
            "Pipeline run finished"
        );

        Ok(PipelineOutcome {
            episode_dir: layout.dir().to_path_buf(),
            source_video,
            subtitle,
            muxed,
            compressed,
            torrent_name,
            notified,
            stages,
        })
    }

    /// Search, rank, download the best torrent and move its video into the
    /// episode directory. Returns the video path and the torrent name.
    async fn download(
        &self,
        request: &EpisodeRequest,
        layout: &EpisodeLayout,
    ) -> Result<(PathBuf, String), PipelineError> {
        let query = request.search_query();
        let result = self.searcher.search(&SearchQuery::new(query.clone())).await?;
        info!(
            searcher = self.searcher.name(),
            query = %query,
            results = result.candidates.len(),
            failed_categories = result.category_errors.len(),
            duration_ms = result.duration_ms,
            "Torrent search finished"
        );
        if result.candidates.is_empty() {
            return Err(PipelineError::NotFound(format!(
                "no torrents found for '{}'",
                query
            )));
        }

        let ranker = Ranker::new(self.config.ranking.policy, self.config.ranking.min_seeds);
        let ranked = ranker.rank(result.candidates, &query)?;
        ranked.log_dump();

        let best = ranked.best();
        let candidate = best.candidate.clone();
        info!(
            name = %candidate.name,
            hash = %candidate.info_hash,
            seeders = candidate.seeders,
            size = %format_bytes(candidate.size_bytes),
            score = best.score,
            policy = %ranked.policy,
            "Selected torrent"
        );
        self.notifications
            .send_text(format!(
                "Found {} ({} seeders, {})",
                candidate.name,
                candidate.seeders,
                format_bytes(candidate.size_bytes)
            ))
            .await;

        let magnet = build_magnet(
            &candidate.info_hash,
            &candidate.name,
            &self.config.torrent.trackers,
        );
        let incomplete = layout.incomplete_dir();
        fs::create_dir_all(&incomplete).await?;

        let added = self
            .torrents
            .add_torrent(AddTorrentRequest::magnet(magnet).with_output_folder(&incomplete))
            .await?;
        let name = added.name.clone().unwrap_or(candidate.name);
        info!(
            client = self.torrents.name(),
            hash = %added.hash,
            name = %name,
            "Torrent added"
        );

        self.wait_for_download(&added.hash).await?;

        if self.config.pipeline.remove_completed {
            if let Err(e) = self.torrents.remove_torrent(&added.hash, false).await {
                warn!(hash = %added.hash, error = %e, "Failed to remove completed torrent");
            }
        }

        let payload = find_largest_media(&incomplete).await?.ok_or_else(|| {
            PipelineError::NotFound(format!("torrent '{}' contains no video file", name))
        })?;
        let file_name = payload.file_name().ok_or_else(|| {
            PipelineError::NotFound(format!("torrent '{}' contains no video file", name))
        })?;
        let destination = layout.dir().join(file_name);
        move_file(&payload, &destination).await?;
        info!(path = %destination.display(), "Moved video into episode directory");

        if let Err(e) = fs::remove_dir_all(&incomplete).await {
            warn!(dir = %incomplete.display(), error = %e, "Failed to clean up download folder");
        }

        Ok((destination, name))
    }

    /// Poll the torrent until it completes, fails or stops moving.
    async fn wait_for_download(&self, hash: &str) -> Result<(), PipelineError> {
        let poll = Duration::from_millis(self.config.pipeline.download_poll_interval_ms.max(1));
        let stall_timeout = Duration::from_secs(self.config.pipeline.stall_timeout_secs);
        let mut reporter = ProgressReporter::new(self.config.notifier.progress_step_pct);
        let mut last_downloaded = 0u64;
        let mut last_change = Instant::now();

        loop {
            let info = self.torrents.get_torrent(hash).await?;

            if info.state == TorrentState::Error {
                return Err(PipelineError::Transfer(format!(
                    "torrent {} failed: {}",
                    hash,
                    info.error.unwrap_or_else(|| "unknown error".to_string())
                )));
            }

            let events = reporter.observe(info.progress);
            if !events.is_empty() {
                let eta = info.eta_secs.map(Duration::from_secs);
                info!(
                    hash = %hash,
                    progress = %format_progress("Downloading", info.progress, eta),
                    speed = %format!("{}/s", format_bytes(info.download_speed)),
                    peers = info.peers,
                    "Download progress"
                );
                self.notifications.send_progress("Downloading", &events).await;
            }

            if info.is_complete() {
                info!(hash = %hash, size = %format_bytes(info.size_bytes), "Download complete");
                return Ok(());
            }

            if info.downloaded_bytes != last_downloaded {
                last_downloaded = info.downloaded_bytes;
                last_change = Instant::now();
            } else if last_change.elapsed() >= stall_timeout {
                return Err(PipelineError::Transfer(format!(
                    "download of {} stalled: no progress for {}",
                    hash,
                    format_duration(stall_timeout)
                )));
            } else {
                debug!(
                    hash = %hash,
                    state = info.state.as_str(),
                    peers = info.peers,
                    "Waiting for download"
                );
            }

            tokio::time::sleep(poll).await;
        }
    }

    /// Find a subtitle in the target language, or translate one from the
    /// first fallback language that has any, and write it next to `video`.
    async fn fetch_subtitle(
        &self,
        request: &EpisodeRequest,
        layout: &EpisodeLayout,
        video: &Path,
        torrent_name: Option<&str>,
    ) -> Result<PathBuf, PipelineError> {
        self.subtitles.login().await?;

        let mut releases: Vec<String> = Vec::new();
        if let Some(name) = torrent_name {
            releases.push(name.to_string());
        }
        let stem = layout.base_stem(video);
        if !releases.contains(&stem) {
            releases.push(stem);
        }

        let target = &self.config.subtitles.language;
        let mut tried = vec![target.clone()];

        let found = self.search_subtitles(request, target).await?;
        let text = if !found.is_empty() {
            self.download_best(&releases, &found).await?
        } else {
            let mut translated = None;
            for language in &self.config.subtitles.fallback_languages {
                if language == target || tried.contains(language) {
                    continue;
                }
                tried.push(language.clone());

                let found = self.search_subtitles(request, language).await?;
                if found.is_empty() {
                    continue;
                }
                let Some(translator) = &self.translator else {
                    warn!(
                        language = %language,
                        "Subtitles found but no translator is configured"
                    );
                    continue;
                };

                let source = self.download_best(&releases, &found).await?;
                self.notifications
                    .send_text(format!(
                        "No {} subtitles, translating from {}",
                        self.config.subtitles.language_name, language
                    ))
                    .await;
                let text = translate_subtitles(
                    translator.as_ref(),
                    &source,
                    language,
                    &self.config.subtitles.language_name,
                    self.config.translator.cues_per_block,
                )
                .await?;
                translated = Some(text);
                break;
            }
            translated.ok_or_else(|| {
                PipelineError::NotFound(format!(
                    "no subtitles for {} in {}",
                    request,
                    tried.join(", ")
                ))
            })?
        };

        let path = layout.subtitle_path(video);
        write_atomic(&path, text.as_bytes()).await?;
        info!(path = %path.display(), "Subtitle written");
        Ok(path)
    }

    async fn search_subtitles(
        &self,
        request: &EpisodeRequest,
        language: &str,
    ) -> Result<Vec<SubtitleCandidate>, PipelineError> {
        let query = SubtitleSearch {
            title: request.show.clone(),
            season: request.season,
            episode: request.episode,
            language: language.to_string(),
        };
        let found = self.subtitles.search(&query).await?;
        info!(
            provider = self.subtitles.name(),
            language = %language,
            results = found.len(),
            "Subtitle search finished"
        );
        Ok(found)
    }

    async fn download_best(
        &self,
        releases: &[String],
        found: &[SubtitleCandidate],
    ) -> Result<String, PipelineError> {
        let chosen = match_best(releases, found)?;
        info!(
            release = %chosen.release,
            file_id = chosen.subtitle.file_id,
            file_name = chosen.subtitle.file_name.as_deref().unwrap_or(""),
            score = chosen.score,
            "Matched subtitle"
        );
        if chosen.score == 0.0 {
            warn!(
                release = %chosen.release,
                file_id = chosen.subtitle.file_id,
                "No subtitle shares a word with the release, using the first result"
            );
        }

        let text = self.subtitles.download(chosen.subtitle.file_id).await?;
        if !srt::looks_like_srt(&text) {
            return Err(PipelineError::Transfer(format!(
                "subtitle file {} is not SubRip",
                chosen.subtitle.file_id
            )));
        }
        Ok(text)
    }

    async fn burn_subtitles(
        &self,
        layout: &EpisodeLayout,
        video: &Path,
        subtitle: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let converter = &self.config.converter;
        let job = ConversionJob::new(
            video,
            layout.muxed_path(video),
            ConversionKind::BurnSubtitles {
                subtitle_path: subtitle.to_path_buf(),
                style: None,
                encoding: VideoEncoding {
                    crf: converter.burn_crf,
                    preset: converter.burn_preset.clone(),
                    max_height: None,
                    audio_bitrate_kbps: BURN_AUDIO_BITRATE_KBPS,
                },
            },
        );
        self.convert("Burning subtitles", job).await
    }

    async fn compress(&self, layout: &EpisodeLayout, muxed: &Path) -> Result<PathBuf, PipelineError> {
        let compress = &self.config.compress;
        let job = ConversionJob::new(
            muxed,
            layout.compressed_path(muxed),
            ConversionKind::Compress {
                encoding: VideoEncoding {
                    crf: compress.crf,
                    preset: compress.preset.clone(),
                    max_height: (compress.max_height > 0).then_some(compress.max_height),
                    audio_bitrate_kbps: compress.audio_bitrate_kbps,
                },
            },
        );
        self.convert("Compressing", job).await
    }

    /// Run a conversion, forwarding its progress to the chat as it goes.
    async fn convert(&self, label: &str, job: ConversionJob) -> Result<PathBuf, PipelineError> {
        info!(
            converter = self.converter.name(),
            job_id = %job.job_id,
            kind = job.kind.as_str(),
            input = %job.input_path.display(),
            output = %job.output_path.display(),
            "Starting conversion"
        );

        let (tx, mut rx) = mpsc::channel::<ConversionProgress>(32);
        let mut reporter = ProgressReporter::new(self.config.notifier.progress_step_pct);
        let notifications = &self.notifications;
        let forward = async move {
            while let Some(progress) = rx.recv().await {
                let events = reporter.observe(f64::from(progress.percent) / 100.0);
                if !events.is_empty() {
                    debug!(
                        job_id = %progress.job_id,
                        percent = progress.percent,
                        speed = progress.speed.as_deref().unwrap_or("?"),
                        "Conversion progress"
                    );
                    notifications.send_progress(label, &events).await;
                }
            }
        };

        let (result, ()) = tokio::join!(self.converter.convert_with_progress(job, tx), forward);
        let result = result?;

        info!(
            output = %result.output_path.display(),
            size = %format_bytes(result.output_size_bytes),
            duration_ms = result.duration_ms,
            "Conversion finished"
        );
        Ok(result.output_path)
    }
}
