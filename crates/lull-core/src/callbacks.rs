use std::{fmt, sync::Arc};

use url::Url;

use crate::error::PlaybackError;

type Callback = Arc<dyn Fn() + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&PlaybackError) + Send + Sync>;
type TimeCallback = Arc<dyn Fn(f64, Option<f64>) + Send + Sync>;
type BufferingCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Application hooks invoked by a host controller.
///
/// All hooks run on the controller task, in event order.
#[derive(Clone, Default)]
pub struct PlayerCallbacks {
    pub on_playback_start: Option<Callback>,
    pub on_playback_complete: Option<Callback>,
    pub on_error: Option<ErrorCallback>,
    /// Called with `(current_time, duration)` in seconds.
    pub on_time_update: Option<TimeCallback>,
    pub on_buffering: Option<BufferingCallback>,
    pub on_stream_complete: Option<Callback>,
}

impl fmt::Debug for PlayerCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerCallbacks")
            .field("on_playback_start", &self.on_playback_start.is_some())
            .field("on_playback_complete", &self.on_playback_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_time_update", &self.on_time_update.is_some())
            .field("on_buffering", &self.on_buffering.is_some())
            .field("on_stream_complete", &self.on_stream_complete.is_some())
            .finish()
    }
}

impl PlayerCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_playback_start(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_playback_start = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_playback_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_playback_complete = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&PlaybackError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_time_update(mut self, f: impl Fn(f64, Option<f64>) + Send + Sync + 'static) -> Self {
        self.on_time_update = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_buffering(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_buffering = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_stream_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_stream_complete = Some(Arc::new(f));
        self
    }

    pub fn playback_started(&self) {
        if let Some(f) = &self.on_playback_start {
            f();
        }
    }

    pub fn playback_completed(&self) {
        if let Some(f) = &self.on_playback_complete {
            f();
        }
    }

    pub fn failed(&self, error: &PlaybackError) {
        if let Some(f) = &self.on_error {
            f(error);
        }
    }

    pub fn time_updated(&self, current_time: f64, duration: Option<f64>) {
        if let Some(f) = &self.on_time_update {
            f(current_time, duration);
        }
    }

    pub fn buffering_changed(&self, buffering: bool) {
        if let Some(f) = &self.on_buffering {
            f(buffering);
        }
    }

    pub fn stream_completed(&self) {
        if let Some(f) = &self.on_stream_complete {
            f();
        }
    }
}

/// Construction input shared by both host controller variants.
#[derive(Clone, Debug, Default)]
pub struct PlayerOptions {
    /// Playlist to play; `None` keeps the controller idle.
    pub playlist_url: Option<Url>,
    /// Start playback as soon as the source is ready.
    pub auto_play: bool,
    pub callbacks: PlayerCallbacks,
}

impl PlayerOptions {
    #[must_use]
    pub fn new(playlist_url: Option<Url>) -> Self {
        Self {
            playlist_url,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = auto_play;
        self
    }

    #[must_use]
    pub fn with_callbacks(mut self, callbacks: PlayerCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }
}
