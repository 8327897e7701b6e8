//! End-to-end pipeline runs against mock collaborators.
//!
//! These tests verify:
//! - Candidate selection, download and payload placement
//! - Subtitle matching, fallback translation and file naming
//! - Burn and compress jobs and the final chat delivery
//! - Error categories for every way a run can fail

mod common;

use std::sync::Arc;

use common::{TestHarness, BEST_HASH, BEST_RELEASE};
use subgrab_core::{
    notifier::Delivery,
    pipeline::{PipelineError, Stage, StageStatus},
    subtitles::srt,
    testing::{fixtures, MockConverter, SentMessage},
};

#[tokio::test]
async fn test_full_run_produces_every_output() {
    let harness = TestHarness::seeded().await;
    harness.torrents.set_progress_steps(vec![0.3, 0.65, 1.0]).await;

    let outcome = harness.pipeline().run(&harness.request()).await.unwrap();

    // Best-ranked candidate was downloaded into the .incomplete folder
    let added = harness.torrents.added_torrents().await;
    assert_eq!(added.len(), 1);
    assert!(added[0].magnet.contains(&format!("btih:{}", BEST_HASH)));
    assert_eq!(
        added[0].output_folder.as_deref(),
        Some(harness.episode_dir().join(".incomplete").as_path())
    );
    assert_eq!(
        harness.torrents.removed_torrents().await,
        vec![(BEST_HASH.to_string(), false)]
    );

    // Every output sits in the episode directory, nothing temporary left
    assert_eq!(
        harness.episode_files(),
        vec![
            format!("{}.heb.srt", BEST_RELEASE),
            format!("{}.hebsub.mp4", BEST_RELEASE),
            format!("{}.mkv", BEST_RELEASE),
            format!("{}.whatsapp.mp4", BEST_RELEASE),
        ]
    );
    assert!(!harness.episode_dir().join(".incomplete").exists());

    assert_eq!(outcome.torrent_name.as_deref(), Some(BEST_RELEASE));
    assert_eq!(
        outcome.source_video,
        Some(harness.episode_dir().join(format!("{}.mkv", BEST_RELEASE)))
    );
    for stage in [Stage::Download, Stage::Subtitle, Stage::Mux, Stage::Compress, Stage::Notify] {
        assert_eq!(outcome.status(stage), Some(StageStatus::Ran), "{}", stage);
    }

    // The subtitle whose name matched the release was used as-is
    assert_eq!(harness.subtitles.downloaded_ids().await, vec![2]);
    assert_eq!(harness.subtitles.login_count().await, 1);
    let subtitle = std::fs::read_to_string(outcome.subtitle.as_ref().unwrap()).unwrap();
    assert_eq!(subtitle, fixtures::SAMPLE_SRT);
    assert_eq!(harness.translator.calls().await, 0);

    assert_eq!(harness.converter.count_kind("burn_subtitles").await, 1);
    assert_eq!(harness.converter.count_kind("compress").await, 1);

    // Progress and the compressed video reached the chat
    let texts = harness.notifier.sent_texts().await;
    assert_eq!(texts[0], "Starting Rick and Morty S08E05");
    assert!(texts.iter().any(|t| t.starts_with("Found Rick.and.Morty.S08E05.1080p.WEB (30 seeders")));
    for pct in [20, 40, 60, 80, 100] {
        let prefix = format!("Downloading: {}%", pct);
        assert_eq!(
            texts.iter().filter(|t| t.starts_with(&prefix)).count(),
            1,
            "{}",
            prefix
        );
    }
    assert_eq!(outcome.notified, Some(Delivery::Delivered));
    assert_eq!(
        harness.notifier.sent().await.last(),
        Some(&SentMessage::Video {
            path: outcome.compressed.clone().unwrap(),
            caption: "Rick and Morty S08E05 (Hebrew subtitles)".to_string(),
        })
    );
}

#[tokio::test]
async fn test_translates_fallback_language() {
    let harness = TestHarness::new().await;
    harness.seed_search().await;
    harness
        .subtitles
        .set_results(
            "en",
            vec![fixtures::subtitle_candidate(9, "Rick.and.Morty.S08E05.WEB.srt", "en")],
        )
        .await;
    harness.subtitles.set_file(9, fixtures::SAMPLE_SRT).await;

    let outcome = harness.pipeline().run(&harness.request()).await.unwrap();

    let languages: Vec<String> = harness
        .subtitles
        .recorded_searches()
        .await
        .into_iter()
        .map(|s| s.language)
        .collect();
    assert_eq!(languages, vec!["he", "en"]);
    assert_eq!(harness.translator.calls().await, 1);

    let subtitle = std::fs::read_to_string(outcome.subtitle.as_ref().unwrap()).unwrap();
    assert!(subtitle.contains("[Hebrew] Where were you last night?"));
    assert!(subtitle.contains("[Hebrew] - Just out."));
    assert_eq!(
        srt::timestamp_lines(&subtitle),
        srt::timestamp_lines(fixtures::SAMPLE_SRT)
    );

    let texts = harness.notifier.sent_texts().await;
    assert!(texts.contains(&"No Hebrew subtitles, translating from en".to_string()));
}

#[tokio::test]
async fn test_no_subtitles_anywhere_is_not_found() {
    let harness = TestHarness::new().await;
    harness.seed_search().await;

    let err = harness.pipeline().run(&harness.request()).await.unwrap_err();

    match err {
        PipelineError::NotFound(msg) => assert!(msg.contains("he, en"), "{}", msg),
        other => panic!("unexpected error: {:?}", other),
    }
    // The download survives for the next run; nothing later was produced
    assert_eq!(harness.episode_files(), vec![format!("{}.mkv", BEST_RELEASE)]);
    assert!(harness.converter.recorded_jobs().await.is_empty());
}

#[tokio::test]
async fn test_fallback_without_translator_is_not_found() {
    let harness = TestHarness::new().await;
    harness.seed_search().await;
    harness
        .subtitles
        .set_results("en", vec![fixtures::subtitle_candidate(9, "x.srt", "en")])
        .await;

    let pipeline = subgrab_core::Pipeline::new(
        harness.config.clone(),
        harness.searcher.clone(),
        harness.torrents.clone(),
        harness.subtitles.clone(),
        harness.converter.clone(),
        harness.channel.clone(),
    );
    let err = pipeline.run(&harness.request()).await.unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));
    assert!(harness.subtitles.downloaded_ids().await.is_empty());
}

#[tokio::test]
async fn test_threshold_filter_empty() {
    let harness = TestHarness::new().await;
    harness
        .searcher
        .set_results(vec![
            fixtures::torrent_candidate("Rick.and.Morty.S08E05.1080p", "aa", 1),
            fixtures::torrent_candidate("Rick.and.Morty.S08E05.720p", "bb", 4),
        ])
        .await;

    let err = harness.pipeline().run(&harness.request()).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::ThresholdFilterEmpty {
            threshold: 5,
            total: 2
        }
    ));
    assert_eq!(harness.torrents.add_count().await, 0);
}

#[tokio::test]
async fn test_empty_search_is_not_found() {
    let harness = TestHarness::new().await;

    let err = harness.pipeline().run(&harness.request()).await.unwrap_err();

    assert_eq!(err.kind(), "not_found");
    assert_eq!(harness.searcher.search_count().await, 1);
    assert_eq!(
        harness.searcher.recorded_searches().await[0].query,
        "Rick and Morty S08E05"
    );
    assert_eq!(harness.torrents.add_count().await, 0);
}

#[tokio::test]
async fn test_stalled_download_is_transfer_error() {
    let harness = TestHarness::seeded().await;
    harness.torrents.set_stalled(true).await;

    let err = harness.pipeline().run(&harness.request()).await.unwrap_err();

    match err {
        PipelineError::Transfer(msg) => assert!(msg.contains("stalled"), "{}", msg),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(harness.subtitles.recorded_searches().await.is_empty());
}

#[tokio::test]
async fn test_torrent_error_state_is_transfer_error() {
    let harness = TestHarness::seeded().await;
    harness.torrents.set_failure("tracker refused").await;

    let err = harness.pipeline().run(&harness.request()).await.unwrap_err();

    match err {
        PipelineError::Transfer(msg) => assert!(msg.contains("tracker refused"), "{}", msg),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_subtitle_login_failure_is_provider_auth() {
    let harness = TestHarness::seeded().await;
    harness.subtitles.set_login_failure("invalid api key").await;

    let err = harness.pipeline().run(&harness.request()).await.unwrap_err();

    assert!(matches!(err, PipelineError::ProviderAuth(ref m) if m == "invalid api key"));
}

#[tokio::test]
async fn test_burn_failure_is_subprocess_error() {
    let harness = TestHarness::seeded().await;
    let converter = Arc::new(MockConverter::new());
    converter.fail_kind("burn_subtitles").await;

    let err = harness
        .pipeline_with_converter(converter.clone())
        .run(&harness.request())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "subprocess");
    assert!(!harness
        .episode_files()
        .iter()
        .any(|name| name.contains(".hebsub.")));
}

#[tokio::test]
async fn test_compress_disabled_delivers_muxed_video() {
    let mut harness = TestHarness::seeded().await;
    harness.config.compress.enabled = false;

    let outcome = harness.pipeline().run(&harness.request()).await.unwrap();

    assert_eq!(outcome.status(Stage::Compress), Some(StageStatus::Disabled));
    assert!(outcome.compressed.is_none());
    assert_eq!(harness.converter.count_kind("compress").await, 0);
    match harness.notifier.sent().await.last() {
        Some(SentMessage::Video { path, .. }) => assert_eq!(path, &outcome.muxed),
        other => panic!("unexpected message: {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_video_falls_back_to_text() {
    let harness = TestHarness::seeded().await;
    harness.notifier.set_reject_videos(true).await;

    let outcome = harness.pipeline().run(&harness.request()).await.unwrap();

    assert_eq!(outcome.notified, Some(Delivery::FellBack));
    let texts = harness.notifier.sent_texts().await;
    assert!(texts
        .last()
        .unwrap()
        .starts_with("Rick and Morty S08E05 (Hebrew subtitles)\n(video not sent"));
}

#[tokio::test]
async fn test_similarity_policy_prefers_closest_name() {
    let mut harness = TestHarness::new().await;
    harness.config.ranking.policy = subgrab_core::ScoringPolicy::Similarity;
    harness
        .searcher
        .set_results(vec![
            fixtures::torrent_candidate("Completely Different Thing 1080p", "aa", 500),
            fixtures::torrent_candidate("Rick and Morty S08E05 720p", "bb", 10),
        ])
        .await;
    harness.seed_target_subtitles().await;

    let outcome = harness.pipeline().run(&harness.request()).await.unwrap();

    assert_eq!(outcome.torrent_name.as_deref(), Some("Rick and Morty S08E05 720p"));
}

#[tokio::test]
async fn test_unrelated_subtitle_name_still_used() {
    let harness = TestHarness::new().await;
    harness.seed_search().await;
    harness
        .subtitles
        .set_results("he", vec![fixtures::subtitle_candidate(5, "zzz.srt", "he")])
        .await;
    harness.subtitles.set_file(5, fixtures::SAMPLE_SRT).await;

    let outcome = harness.pipeline().run(&harness.request()).await.unwrap();

    assert_eq!(harness.subtitles.downloaded_ids().await, vec![5]);
    assert_eq!(outcome.status(Stage::Subtitle), Some(StageStatus::Ran));
}
