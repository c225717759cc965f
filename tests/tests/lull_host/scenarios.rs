use std::time::Duration;

use lull::Host;
use lull_agent::{AgentConfig, MediaEvent};
use lull_bridge::LocalSurface;
use lull_core::{PlaybackError, PlaybackState, PlayerOptions};
use lull_hls::{ClientError, ClientEvent, ErrorCategory, ErrorDetails, LevelDetails};
use lull_host::{ControllerConfig, DirectPlayer, PlaybackController, SandboxedPlayer};
use lull_test_utils::{ClientCall, FakeMediaElement, MediaCall, ScriptedClientFactory};
use rstest::rstest;

use crate::common::{CallbackLog, callback_log, cdn_url, settle, tracing_setup};

fn spawn(
    host: Host,
    options: PlayerOptions,
    media: &FakeMediaElement,
    factory: &ScriptedClientFactory,
) -> Box<dyn PlaybackController> {
    let config = ControllerConfig::default();
    match host {
        Host::Direct => Box::new(DirectPlayer::spawn(
            options,
            config,
            media.clone(),
            factory.clone(),
        )),
        Host::Sandboxed => {
            let surface =
                LocalSurface::spawn(AgentConfig::default(), media.clone(), factory.clone());
            Box::new(SandboxedPlayer::spawn(options, config, surface))
        }
    }
}

fn vod_level(name: &str, duration: f64) -> ClientEvent {
    ClientEvent::LevelLoaded(LevelDetails {
        url: cdn_url(name),
        live: false,
        total_duration: Duration::from_secs_f64(duration),
        duration: Some(duration),
        target_duration: Duration::from_secs(10),
        fragments: 18,
    })
}

fn fatal(category: ErrorCategory, details: ErrorDetails) -> ClientEvent {
    ClientEvent::Error(ClientError::fatal(category, details, "boom"))
}

#[rstest]
#[case(Host::Direct)]
#[case(Host::Sandboxed)]
#[timeout(Duration::from_secs(5))]
#[tokio::test(start_paused = true)]
async fn vod_source_runs_to_completion(
    _tracing_setup: (),
    callback_log: CallbackLog,
    #[case] host: Host,
) {
    let media = FakeMediaElement::software();
    let factory = ScriptedClientFactory::new();
    let player = spawn(
        host,
        PlayerOptions::new(Some(cdn_url("a"))).with_callbacks(callback_log.callbacks.clone()),
        &media,
        &factory,
    );
    assert_eq!(player.state(), PlaybackState::loading());
    settle().await;

    factory.send(0, ClientEvent::ManifestParsed { variants: 1 });
    settle().await;
    assert!(!player.state().is_loading);

    factory.send(0, vod_level("a", 180.0));
    factory.send(0, vod_level("a", 180.0));
    settle().await;
    assert_eq!(player.state().duration, Some(180.0));
    assert_eq!(callback_log.count("stream-complete"), 1);

    media.emit(MediaEvent::Ended);
    settle().await;

    let state = player.state();
    assert!(state.is_complete);
    assert!(!state.is_playing);
    assert_eq!(state.duration, Some(180.0));
    assert_eq!(callback_log.lines(), vec!["stream-complete", "complete"]);
}

#[rstest]
#[case(Host::Direct)]
#[case(Host::Sandboxed)]
#[timeout(Duration::from_secs(5))]
#[tokio::test(start_paused = true)]
async fn loading_same_url_twice_is_idempotent(#[case] host: Host) {
    let media = FakeMediaElement::software();
    let factory = ScriptedClientFactory::new();
    let player = spawn(host, PlayerOptions::new(Some(cdn_url("a"))), &media, &factory);
    settle().await;

    player.set_playlist_url(Some(cdn_url("a")));
    player.set_playlist_url(Some(cdn_url("a")));
    settle().await;

    assert_eq!(factory.created(), 1);
    assert_eq!(media.count(&MediaCall::AttachBuffer), 1);
    assert_eq!(media.count(&MediaCall::Detach), 0);
}

#[rstest]
#[case(Host::Direct)]
#[case(Host::Sandboxed)]
#[timeout(Duration::from_secs(5))]
#[tokio::test(start_paused = true)]
async fn network_fatal_restarts_load_silently(callback_log: CallbackLog, #[case] host: Host) {
    let media = FakeMediaElement::software();
    let factory = ScriptedClientFactory::new();
    let player = spawn(
        host,
        PlayerOptions::new(Some(cdn_url("a"))).with_callbacks(callback_log.callbacks.clone()),
        &media,
        &factory,
    );
    settle().await;

    factory.send(0, fatal(ErrorCategory::Network, ErrorDetails::ManifestLoadError));
    settle().await;

    assert_eq!(
        factory.calls(0),
        vec![ClientCall::LoadSource(cdn_url("a")), ClientCall::RestartLoad]
    );
    assert_eq!(player.state(), PlaybackState::loading());
    assert!(callback_log.lines().is_empty());
}

#[rstest]
#[case(Host::Direct)]
#[case(Host::Sandboxed)]
#[timeout(Duration::from_secs(5))]
#[tokio::test(start_paused = true)]
async fn media_fatal_recovers_from_playhead(callback_log: CallbackLog, #[case] host: Host) {
    let media = FakeMediaElement::software();
    let factory = ScriptedClientFactory::new();
    let player = spawn(
        host,
        PlayerOptions::new(Some(cdn_url("a"))).with_callbacks(callback_log.callbacks.clone()),
        &media,
        &factory,
    );
    settle().await;
    media.emit(MediaEvent::TimeUpdate { current_time: 42.0 });
    settle().await;

    factory.send(0, fatal(ErrorCategory::Media, ErrorDetails::BufferAppendError));
    settle().await;

    assert_eq!(
        factory.calls(0),
        vec![ClientCall::LoadSource(cdn_url("a")), ClientCall::RecoverMediaError(42.0)]
    );
    assert_eq!(media.count(&MediaCall::ResetBuffer), 1);
    assert!(!player.state().has_error());
    assert!(callback_log.lines().is_empty());
}

#[rstest]
#[case(Host::Direct)]
#[case(Host::Sandboxed)]
#[timeout(Duration::from_secs(5))]
#[tokio::test(start_paused = true)]
async fn seek_without_source_does_nothing(#[case] host: Host) {
    let media = FakeMediaElement::software();
    let factory = ScriptedClientFactory::new();
    let player = spawn(host, PlayerOptions::default(), &media, &factory);
    settle().await;

    player.seek(45.0);
    settle().await;

    assert_eq!(player.state(), PlaybackState::idle());
    assert!(media.calls().is_empty());
}

#[rstest]
#[case(Host::Direct)]
#[case(Host::Sandboxed)]
#[timeout(Duration::from_secs(5))]
#[tokio::test(start_paused = true)]
async fn switching_source_tears_down_previous_once(
    callback_log: CallbackLog,
    #[case] host: Host,
) {
    let media = FakeMediaElement::software();
    let factory = ScriptedClientFactory::new();
    let player = spawn(
        host,
        PlayerOptions::new(Some(cdn_url("a"))).with_callbacks(callback_log.callbacks.clone()),
        &media,
        &factory,
    );
    settle().await;

    player.set_playlist_url(Some(cdn_url("b")));
    settle().await;
    factory.send(0, vod_level("a", 60.0));
    factory.send(0, ClientEvent::ManifestParsed { variants: 1 });
    settle().await;

    assert_eq!(factory.created(), 2);
    assert_eq!(
        factory.calls(0),
        vec![ClientCall::LoadSource(cdn_url("a")), ClientCall::Destroy]
    );
    assert_eq!(factory.calls(1), vec![ClientCall::LoadSource(cdn_url("b"))]);
    assert_eq!(
        media.calls(),
        vec![
            MediaCall::AttachBuffer,
            MediaCall::Detach,
            MediaCall::AttachBuffer
        ]
    );
    assert_eq!(player.state(), PlaybackState::loading());
    assert!(callback_log.lines().is_empty());
}

#[rstest]
#[case(Host::Direct)]
#[case(Host::Sandboxed)]
#[timeout(Duration::from_secs(5))]
#[tokio::test(start_paused = true)]
async fn events_queued_before_switch_never_reach_new_source(
    callback_log: CallbackLog,
    #[case] host: Host,
) {
    let media = FakeMediaElement::software();
    let factory = ScriptedClientFactory::new();
    let player = spawn(
        host,
        PlayerOptions::new(Some(cdn_url("a"))).with_callbacks(callback_log.callbacks.clone()),
        &media,
        &factory,
    );
    settle().await;
    factory.send(0, ClientEvent::ManifestParsed { variants: 1 });
    media.emit(MediaEvent::Playing);
    settle().await;
    assert!(player.state().is_playing);

    // Queued for A, switch requested before any task gets to run.
    factory.send(0, vod_level("a", 180.0));
    media.emit(MediaEvent::TimeUpdate { current_time: 95.0 });
    media.emit(MediaEvent::Ended);
    factory.send(0, fatal(ErrorCategory::Other, ErrorDetails::LevelParsingError));
    player.set_playlist_url(Some(cdn_url("b")));
    settle().await;

    assert_eq!(player.state(), PlaybackState::loading());
    assert_eq!(callback_log.lines(), vec!["start"]);
    assert_eq!(factory.calls(1), vec![ClientCall::LoadSource(cdn_url("b"))]);
}

#[rstest]
#[case(Host::Direct)]
#[case(Host::Sandboxed)]
#[timeout(Duration::from_secs(5))]
#[tokio::test(start_paused = true)]
async fn retry_resets_state_and_reinitializes_once(
    callback_log: CallbackLog,
    #[case] host: Host,
) {
    let media = FakeMediaElement::software();
    let factory = ScriptedClientFactory::new();
    let player = spawn(
        host,
        PlayerOptions::new(Some(cdn_url("a"))).with_callbacks(callback_log.callbacks.clone()),
        &media,
        &factory,
    );
    settle().await;
    factory.send(0, ClientEvent::ManifestParsed { variants: 1 });
    factory.send(0, vod_level("a", 180.0));
    factory.send(0, fatal(ErrorCategory::Other, ErrorDetails::LevelParsingError));
    settle().await;

    let failed = player.state();
    assert_eq!(
        failed.error,
        Some(PlaybackError::fatal("otherError: levelParsingError"))
    );
    assert_eq!(failed.duration, Some(180.0));

    player.retry();
    player.retry();
    settle().await;

    assert_eq!(player.state(), PlaybackState::loading());
    assert_eq!(factory.created(), 2);
    assert_eq!(
        factory.calls(1),
        vec![ClientCall::LoadSource(cdn_url("a"))]
    );
    assert_eq!(
        callback_log.lines(),
        vec!["stream-complete", "error otherError: levelParsingError"]
    );
}

#[rstest]
#[case(Host::Direct)]
#[case(Host::Sandboxed)]
#[timeout(Duration::from_secs(5))]
#[tokio::test(start_paused = true)]
async fn unsupported_environment_is_fatal(callback_log: CallbackLog, #[case] host: Host) {
    let media = FakeMediaElement::software();
    let factory = ScriptedClientFactory::unsupported();
    let player = spawn(
        host,
        PlayerOptions::new(Some(cdn_url("a"))).with_callbacks(callback_log.callbacks.clone()),
        &media,
        &factory,
    );
    settle().await;

    let error = player.state().error.expect("fatal error");
    assert!(error.message().starts_with("unsupported environment"));
    assert_eq!(factory.created(), 0);
    assert_eq!(callback_log.lines().len(), 1);
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test(start_paused = true)]
async fn sandboxed_auto_play_waits_for_ready_then_settle() {
    let media = FakeMediaElement::native();
    let factory = ScriptedClientFactory::new();
    let player = spawn(
        Host::Sandboxed,
        PlayerOptions::new(Some(cdn_url("a"))).with_auto_play(true),
        &media,
        &factory,
    );
    player.play();
    player.seek(10.0);

    settle().await;

    assert_eq!(
        media.calls(),
        vec![MediaCall::SetSource(cdn_url("a")), MediaCall::Play]
    );
    assert!(player.state().is_playing);
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test(start_paused = true)]
async fn direct_auto_play_waits_for_loaded() {
    let media = FakeMediaElement::software();
    let factory = ScriptedClientFactory::new();
    let player = spawn(
        Host::Direct,
        PlayerOptions::new(Some(cdn_url("a"))).with_auto_play(true),
        &media,
        &factory,
    );
    settle().await;
    assert_eq!(media.count(&MediaCall::Play), 0);

    factory.send(0, ClientEvent::ManifestParsed { variants: 1 });
    settle().await;

    assert_eq!(media.count(&MediaCall::Play), 1);
    assert!(player.state().is_playing);
}
