#![forbid(unsafe_code)]

use lull_hls::Fragment;
use tokio::sync::broadcast;
use url::Url;

use crate::error::MediaResult;

/// Answer of a media capability probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CanPlay {
    #[default]
    No,
    Maybe,
    Probably,
}

impl CanPlay {
    #[must_use]
    pub fn is_positive(self) -> bool {
        !matches!(self, Self::No)
    }
}

/// Notification raised by a media element.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaEvent {
    /// Enough data to start playback.
    CanPlay,
    Playing,
    Pause,
    /// Playback stalled waiting for data.
    Waiting,
    TimeUpdate { current_time: f64 },
    /// `None` or a non-finite value means unknown / infinite.
    DurationChange { duration: Option<f64> },
    Ended,
    Error { message: String },
}

/// The audio output primitive driven by the agent.
///
/// One element lives as long as its agent; sources come and go. Two ways to
/// feed it: [`set_source`](Self::set_source) for native playback, or
/// [`attach_buffer`](Self::attach_buffer) followed by
/// [`append`](Self::append) for fragments delivered by a software client.
pub trait MediaElement: Send + 'static {
    fn can_play_type(&self, mime: &str) -> CanPlay;

    /// Subscribe to element events. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<MediaEvent>;

    /// Play `url` natively.
    fn set_source(&self, url: &Url);

    /// Attach an empty media buffer for appended fragments.
    fn attach_buffer(&self);

    fn append(&self, fragment: &Fragment) -> MediaResult<()>;

    /// Drop buffered data after a media failure, keeping the buffer attached.
    fn reset_buffer(&self);

    /// No more fragments will be appended.
    fn end_of_stream(&self);

    /// Stop playback and release the current source or buffer.
    fn detach(&self);

    /// Start playback. Completion is signalled by [`MediaEvent::Playing`].
    fn play(&self) -> MediaResult<()>;

    fn pause(&self);

    fn seek(&self, time: f64);

    fn set_volume(&self, volume: f64);

    /// Current duration, if known and finite.
    fn duration(&self) -> Option<f64>;
}
