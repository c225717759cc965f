//! Load an HLS playlist and log every playback state transition.
//!
//! ```
//! cargo run -p lull --example watch_state [URL] [--sandboxed]
//! ```
//!
//! Fragments are discarded; a simulated clock advances by each fragment's
//! duration so time updates and completion can be observed.

use std::{
    env::args,
    error::Error,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use lull::{hls::Fragment, prelude::*};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{info, metadata::LevelFilter};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Media element that plays nothing and only keeps time.
#[derive(Clone)]
struct SilentMedia {
    events: broadcast::Sender<MediaEvent>,
    buffered: Arc<Mutex<f64>>,
    playing: Arc<AtomicBool>,
}

impl SilentMedia {
    fn new() -> Self {
        Self {
            events: broadcast::channel(256).0,
            buffered: Arc::default(),
            playing: Arc::default(),
        }
    }

    fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }
}

impl MediaElement for SilentMedia {
    fn can_play_type(&self, _mime: &str) -> CanPlay {
        CanPlay::No
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }

    fn set_source(&self, _url: &Url) {}

    fn attach_buffer(&self) {
        *self.buffered.lock() = 0.0;
    }

    fn append(&self, fragment: &Fragment) -> MediaResult<()> {
        let current_time = {
            let mut buffered = self.buffered.lock();
            *buffered += fragment.duration.as_secs_f64();
            *buffered
        };
        if self.playing.load(Ordering::Relaxed) {
            self.emit(MediaEvent::TimeUpdate { current_time });
        }
        Ok(())
    }

    fn reset_buffer(&self) {}

    fn end_of_stream(&self) {
        self.emit(MediaEvent::DurationChange {
            duration: Some(*self.buffered.lock()),
        });
        self.emit(MediaEvent::Ended);
    }

    fn detach(&self) {
        self.playing.store(false, Ordering::Relaxed);
    }

    fn play(&self) -> MediaResult<()> {
        self.playing.store(true, Ordering::Relaxed);
        self.emit(MediaEvent::Playing);
        Ok(())
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::Relaxed);
        self.emit(MediaEvent::Pause);
    }

    fn seek(&self, _time: f64) {}

    fn set_volume(&self, _volume: f64) {}

    fn duration(&self) -> Option<f64> {
        None
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::default()
                .add_directive("lull_hls=debug".parse()?)
                .add_directive("lull_net=warn".parse()?)
                .add_directive(LevelFilter::INFO.into()),
        )
        .with_line_number(false)
        .with_file(false)
        .init();

    let url: Url = args()
        .nth(1)
        .filter(|arg| !arg.starts_with("--"))
        .unwrap_or_else(|| "https://stream.silvercomet.top/hls/master.m3u8".to_string())
        .parse()?;
    let host = if args().any(|arg| arg == "--sandboxed") {
        Host::Sandboxed
    } else {
        Host::Direct
    };

    info!(%url, ?host, "opening playlist");

    let callbacks = PlayerCallbacks::new()
        .on_stream_complete(|| info!("all segments published"))
        .on_error(|error| info!(%error, "playback failed"));
    let player = create_player(
        PlayerOptions::new(Some(url))
            .with_auto_play(true)
            .with_callbacks(callbacks),
        PlayerConfig::default().with_host(host),
        SilentMedia::new(),
    )?;

    let mut state = player.watch();
    let mut phase = state.borrow().phase(true);
    info!(?phase, "initial state");
    while state.changed().await.is_ok() {
        let snapshot = state.borrow_and_update().clone();
        let next = snapshot.phase(true);
        if next != phase {
            info!(?phase, ?next, current_time = snapshot.current_time, "transition");
            phase = next;
        }
        if snapshot.is_complete || snapshot.has_error() {
            break;
        }
    }

    info!("done");
    Ok(())
}
