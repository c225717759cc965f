use std::{sync::Arc, time::Duration};

use lull_core::PlayerCallbacks;
use parking_lot::Mutex;
use rstest::*;
use url::Url;

#[fixture]
pub fn tracing_setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::default()
                .add_directive("warn".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}

#[fixture]
pub fn debug_tracing_setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::default()
                .add_directive("lull_hls=debug".parse().expect("valid directive"))
                .add_directive("lull_agent=debug".parse().expect("valid directive"))
                .add_directive("lull_host=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}

/// Application hooks that append one line per call to a shared log.
pub struct CallbackLog {
    pub callbacks: PlayerCallbacks,
    pub lines: Arc<Mutex<Vec<String>>>,
}

impl CallbackLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn count(&self, line: &str) -> usize {
        self.lines.lock().iter().filter(|l| *l == line).count()
    }
}

#[fixture]
pub fn callback_log() -> CallbackLog {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let push = |lines: &Arc<Mutex<Vec<String>>>, line: &'static str| {
        let lines = Arc::clone(lines);
        move || lines.lock().push(line.to_string())
    };
    let callbacks = PlayerCallbacks::new()
        .on_playback_start(push(&lines, "start"))
        .on_playback_complete(push(&lines, "complete"))
        .on_stream_complete(push(&lines, "stream-complete"))
        .on_buffering({
            let lines = Arc::clone(&lines);
            move |b| lines.lock().push(format!("buffering {b}"))
        })
        .on_error({
            let lines = Arc::clone(&lines);
            move |e| lines.lock().push(format!("error {e}"))
        });
    CallbackLog { callbacks, lines }
}

/// Playlist URL on a host nobody resolves.
pub fn cdn_url(name: &str) -> Url {
    Url::parse(&format!("https://cdn.test/{name}/playlist.m3u8")).unwrap()
}

/// Let every task run until the runtime is idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(500)).await;
}
