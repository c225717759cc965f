use std::{sync::Arc, time::Duration};

use lull_hls::{
    ClientEvent, ClientEventReceiver, ErrorCategory, ErrorDetails, HlsClient, LoaderConfig,
    SegmentClient, SessionId, client_channel,
};
use lull_net::{HttpClient, NetOptions, RetryPolicy};
use lull_test_utils::{HlsOrigin, media_playlist};
use rstest::rstest;
use tokio::time::timeout;

use crate::common::tracing_setup;

const MASTER: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=64000,CODECS=\"mp4a.40.5\"
low.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=256000,CODECS=\"mp4a.40.2\"
high.m3u8
";

fn client(config: LoaderConfig) -> (HlsClient<HttpClient>, ClientEventReceiver) {
    let (tx, rx) = client_channel(SessionId(1));
    let net = HttpClient::new(NetOptions::default()).unwrap();
    (HlsClient::new(Arc::new(net), config, tx).unwrap(), rx)
}

async fn next(rx: &mut ClientEventReceiver) -> ClientEvent {
    let (session, event) = timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("client event in time")
        .expect("client channel open");
    assert_eq!(session, SessionId(1));
    event
}

fn fragment_sequence(event: &ClientEvent) -> u64 {
    match event {
        ClientEvent::FragmentLoaded(fragment) => fragment.sequence,
        other => panic!("expected fragment, got {other:?}"),
    }
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn vod_playlist_delivers_every_fragment(_tracing_setup: ()) {
    let origin = HlsOrigin::new()
        .with_segments(0, 3)
        .with_playlist("playlist.m3u8", media_playlist(0, 3, 4.0, true));
    let server = origin.serve().await;
    let (client, mut rx) = client(LoaderConfig::default());

    client.load_source(server.url("playlist.m3u8"));

    assert_eq!(next(&mut rx).await, ClientEvent::ManifestParsed { variants: 1 });
    let ClientEvent::LevelLoaded(level) = next(&mut rx).await else {
        panic!("expected level");
    };
    assert!(!level.live);
    assert_eq!(level.duration, Some(12.0));
    assert_eq!(level.fragments, 3);

    for seq in 0..3 {
        let ClientEvent::FragmentLoaded(fragment) = next(&mut rx).await else {
            panic!("expected fragment {seq}");
        };
        assert_eq!(fragment.sequence, seq);
        assert_eq!(fragment.data.as_ref(), format!("audio-{seq}").as_bytes());
        assert_eq!(fragment.url, server.url(&format!("segment_{seq:03}.ts")));
    }
    assert_eq!(next(&mut rx).await, ClientEvent::EndOfStream);
    assert_eq!(origin.hits("playlist.m3u8"), 1);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn master_playlist_follows_highest_bandwidth(_tracing_setup: ()) {
    let origin = HlsOrigin::new()
        .with_segments(0, 1)
        .with_playlist("master.m3u8", MASTER.to_string())
        .with_playlist("low.m3u8", media_playlist(0, 1, 4.0, true))
        .with_playlist("high.m3u8", media_playlist(0, 1, 4.0, true));
    let server = origin.serve().await;
    let (client, mut rx) = client(LoaderConfig::default());

    client.load_source(server.url("master.m3u8"));

    assert_eq!(next(&mut rx).await, ClientEvent::ManifestParsed { variants: 2 });
    let ClientEvent::LevelLoaded(level) = next(&mut rx).await else {
        panic!("expected level");
    };
    assert_eq!(level.url, server.url("high.m3u8"));
    assert_eq!(origin.hits("low.m3u8"), 0);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn missing_fragment_fails_then_restart_resumes(_tracing_setup: ()) {
    let origin = HlsOrigin::new()
        .with_segments(0, 3)
        .with_playlist("playlist.m3u8", media_playlist(0, 3, 4.0, true));
    origin.remove("segment_001.ts");
    let server = origin.serve().await;
    let config = LoaderConfig::default()
        .with_fragment_retry(RetryPolicy::new(2, Duration::from_millis(20)));
    let (client, mut rx) = client(config);

    client.load_source(server.url("playlist.m3u8"));
    next(&mut rx).await;
    next(&mut rx).await;
    assert_eq!(fragment_sequence(&next(&mut rx).await), 0);

    let mut errors = Vec::new();
    loop {
        let ClientEvent::Error(error) = next(&mut rx).await else {
            panic!("expected error");
        };
        assert_eq!(error.category, ErrorCategory::Network);
        assert_eq!(error.details, ErrorDetails::FragLoadError);
        let fatal = error.fatal;
        errors.push(fatal);
        if fatal {
            break;
        }
    }
    assert_eq!(errors, vec![false, false, true]);
    assert_eq!(origin.hits("segment_001.ts"), 3);

    origin.put("segment_001.ts", "audio-1");
    client.restart_load();

    assert!(matches!(next(&mut rx).await, ClientEvent::LevelLoaded(_)));
    assert_eq!(fragment_sequence(&next(&mut rx).await), 1);
    assert_eq!(fragment_sequence(&next(&mut rx).await), 2);
    assert_eq!(next(&mut rx).await, ClientEvent::EndOfStream);
    assert_eq!(origin.hits("segment_000.ts"), 1);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn live_playlist_is_followed_until_endlist(_tracing_setup: ()) {
    let origin = HlsOrigin::new()
        .with_segments(0, 5)
        .with_playlist("live.m3u8", media_playlist(0, 3, 1.0, false));
    let server = origin.serve().await;
    let (client, mut rx) = client(LoaderConfig::default());

    client.load_source(server.url("live.m3u8"));
    next(&mut rx).await;
    let ClientEvent::LevelLoaded(level) = next(&mut rx).await else {
        panic!("expected level");
    };
    assert!(level.live);
    assert_eq!(level.duration, None);
    for seq in 0..3 {
        assert_eq!(fragment_sequence(&next(&mut rx).await), seq);
    }

    origin.put("live.m3u8", media_playlist(0, 5, 1.0, true));

    let ClientEvent::LevelLoaded(level) = next(&mut rx).await else {
        panic!("expected refreshed level");
    };
    assert!(!level.live);
    assert_eq!(fragment_sequence(&next(&mut rx).await), 3);
    assert_eq!(fragment_sequence(&next(&mut rx).await), 4);
    assert_eq!(next(&mut rx).await, ClientEvent::EndOfStream);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn unparsable_manifest_is_fatal_other(_tracing_setup: ()) {
    let origin = HlsOrigin::new().with_playlist("playlist.m3u8", "<html>oops</html>".to_string());
    let server = origin.serve().await;
    let (client, mut rx) = client(LoaderConfig::default());

    client.load_source(server.url("playlist.m3u8"));

    let ClientEvent::Error(error) = next(&mut rx).await else {
        panic!("expected error");
    };
    assert!(error.fatal);
    assert_eq!(error.category, ErrorCategory::Other);
    assert_eq!(origin.hits("playlist.m3u8"), 1);
}
