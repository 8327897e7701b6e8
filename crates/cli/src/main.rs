mod args;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subgrab_core::{
    build_notifier, converter::{Converter, FfmpegConverter}, load_config, searcher::ApibaySearcher,
    subtitles::OpenSubtitlesClient, torrent_client::LibrqbitClient,
    translator::OpenAiTranslator, validate_config, NotificationChannel, Pipeline,
    SanitizedConfig,
};

use args::Args;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    info!(version = VERSION, config = ?args.config, "Starting subgrab");
    let mut config = load_config(args.config.as_deref()).context("Failed to load config")?;
    args.apply(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    info!(config = ?SanitizedConfig::from(&config), "Configuration loaded");

    let notifications = Arc::new(match build_notifier(&config.notifier)? {
        Some(notifier) => NotificationChannel::new(notifier, &config.notifier),
        None => NotificationChannel::disabled(),
    });
    if let Err(e) = notifications.connect().await {
        // Transient failures are retried on the next send.
        warn!(error = %e, "Failed to connect notification channel");
    }

    let searcher = Arc::new(
        ApibaySearcher::new(config.searcher.clone()).context("Failed to create searcher")?,
    );
    let torrents = Arc::new(
        LibrqbitClient::new(&config.torrent)
            .await
            .context("Failed to start torrent session")?,
    );
    let subtitles = Arc::new(
        OpenSubtitlesClient::new(config.opensubtitles.clone())
            .context("Failed to create subtitle client")?,
    );
    let converter = Arc::new(FfmpegConverter::new(config.converter.clone()));
    converter.validate().await.context("ffmpeg is not usable")?;

    let translator = if config.translator.is_enabled() {
        Some(Arc::new(
            OpenAiTranslator::new(&config.translator).context("Failed to create translator")?,
        ))
    } else {
        info!("Translation disabled, only subtitles in the target language will be used");
        None
    };

    let failure_grace = Duration::from_millis(config.notifier.failure_grace_ms);
    let mut pipeline = Pipeline::new(
        config,
        searcher,
        torrents,
        subtitles,
        converter,
        notifications.clone(),
    );
    if let Some(translator) = translator {
        pipeline = pipeline.with_translator(translator);
    }

    let request = args.request();
    let result = tokio::select! {
        result = pipeline.run(&request) => result,
        _ = shutdown_signal() => {
            warn!(episode = %request, "Interrupted, outputs written so far are kept");
            notifications.send_text(format!("Interrupted: {}", request)).await;
            notifications.close().await;
            anyhow::bail!("Interrupted");
        }
    };

    match result {
        Ok(outcome) => {
            info!(
                episode = %request,
                deliverable = %outcome.deliverable().display(),
                notified = ?outcome.notified,
                "Done"
            );
            notifications.close().await;
            Ok(())
        }
        Err(e) => {
            error!(episode = %request, kind = e.kind(), error = %e, "Pipeline failed");
            notifications
                .send_text(format!("Failed: {}: {}", request, e))
                .await;
            tokio::time::sleep(failure_grace).await;
            notifications.close().await;
            Err(e).with_context(|| format!("Failed to process {}", request))
        }
    }
}

fn init_logging(json: bool) {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,librqbit=warn".into()),
    );
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
