//! Full stack: host controller, agent, software client and HTTP origin.

use std::time::Duration;

use lull::{Host, PlayerConfig, create_player};
use lull_agent::MediaEvent;
use lull_core::PlayerOptions;
use lull_test_utils::{FakeMediaElement, HlsOrigin, MediaCall, media_playlist};
use rstest::rstest;
use tokio::time::{sleep, timeout};

use crate::common::{CallbackLog, callback_log, tracing_setup};

async fn wait_until(mut condition: impl FnMut() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition reached in time");
}

#[rstest]
#[case(Host::Direct)]
#[case(Host::Sandboxed)]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn vod_playlist_plays_through(
    _tracing_setup: (),
    callback_log: CallbackLog,
    #[case] host: Host,
) {
    let origin = HlsOrigin::new()
        .with_segments(0, 3)
        .with_playlist("playlist.m3u8", media_playlist(0, 3, 4.0, true));
    let server = origin.serve().await;
    let media = FakeMediaElement::software();

    let player = create_player(
        PlayerOptions::new(Some(server.url("playlist.m3u8")))
            .with_auto_play(true)
            .with_callbacks(callback_log.callbacks.clone()),
        PlayerConfig::default().with_host(host),
        media.clone(),
    )
    .unwrap();

    wait_until(|| media.count(&MediaCall::EndOfStream) == 1).await;
    let appended: Vec<_> = media
        .calls()
        .into_iter()
        .filter(|c| matches!(c, MediaCall::Append(_)))
        .collect();
    assert_eq!(
        appended,
        vec![MediaCall::Append(0), MediaCall::Append(1), MediaCall::Append(2)]
    );

    let mut state = player.watch();
    state.wait_for(|s| s.is_playing).await.unwrap();
    assert_eq!(player.state().duration, Some(12.0));

    media.emit(MediaEvent::Ended);
    state.wait_for(|s| s.is_complete).await.unwrap();

    assert_eq!(callback_log.count("stream-complete"), 1);
    assert_eq!(callback_log.count("start"), 1);
    assert_eq!(callback_log.count("complete"), 1);
    assert_eq!(origin.hits("segment_001.ts"), 1);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn live_playlist_completes_on_endlist(_tracing_setup: (), callback_log: CallbackLog) {
    let origin = HlsOrigin::new()
        .with_segments(0, 4)
        .with_playlist("live.m3u8", media_playlist(0, 2, 1.0, false));
    let server = origin.serve().await;
    let media = FakeMediaElement::software();

    let player = create_player(
        PlayerOptions::new(Some(server.url("live.m3u8")))
            .with_callbacks(callback_log.callbacks.clone()),
        PlayerConfig::default(),
        media.clone(),
    )
    .unwrap();

    wait_until(|| media.count(&MediaCall::Append(1)) == 1).await;
    assert_eq!(player.state().duration, None);
    assert_eq!(callback_log.count("stream-complete"), 0);

    origin.put("live.m3u8", media_playlist(0, 4, 1.0, true));

    wait_until(|| media.count(&MediaCall::EndOfStream) == 1).await;
    let mut state = player.watch();
    state.wait_for(|s| s.duration == Some(4.0)).await.unwrap();
    wait_until(|| callback_log.count("stream-complete") == 1).await;
    assert_eq!(media.count(&MediaCall::Append(3)), 1);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn unparsable_playlist_surfaces_error(_tracing_setup: (), callback_log: CallbackLog) {
    let origin = HlsOrigin::new().with_playlist("playlist.m3u8", "not a playlist".to_string());
    let server = origin.serve().await;

    let player = create_player(
        PlayerOptions::new(Some(server.url("playlist.m3u8")))
            .with_callbacks(callback_log.callbacks.clone()),
        PlayerConfig::default(),
        FakeMediaElement::software(),
    )
    .unwrap();

    let mut state = player.watch();
    state.wait_for(|s| s.error.is_some()).await.unwrap();
    assert_eq!(
        callback_log.lines(),
        vec!["error otherError: manifestParsingError"]
    );
    assert_eq!(origin.hits("playlist.m3u8"), 1);
}
