use crate::{error::PlaybackError, protocol::PlaybackEvent};

/// Snapshot of what the user-facing player can observe.
///
/// Never mutated in place: [`apply`](Self::apply) returns the next snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackState {
    /// No frame decoded yet for the current source, or the transport stalled.
    pub is_loading: bool,
    /// Transport is advancing.
    pub is_playing: bool,
    /// Local playback reached end of media.
    pub is_complete: bool,
    /// Last fatal error; terminal until the session is reset.
    pub error: Option<PlaybackError>,
    /// Known finite duration in seconds.
    pub duration: Option<f64>,
    /// Last reported playhead position in seconds.
    pub current_time: f64,
}

/// Coarse state-machine view of a [`PlaybackState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaybackPhase {
    Idle,
    Loading,
    Buffering,
    Playing,
    Paused,
    Complete,
    Error,
}

impl PlaybackState {
    /// State for a controller without a playlist URL.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// State at the start of a session (fresh URL or retry).
    #[must_use]
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    /// Initial state for the given source.
    #[must_use]
    pub fn for_source(has_source: bool) -> Self {
        if has_source {
            Self::loading()
        } else {
            Self::idle()
        }
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Compute the snapshot that follows `event`.
    ///
    /// Once `error` is set every event is ignored until the owner resets the
    /// state for a new session.
    #[must_use]
    pub fn apply(&self, event: &PlaybackEvent) -> Self {
        if self.error.is_some() {
            return self.clone();
        }

        let mut next = self.clone();
        match event {
            PlaybackEvent::Ready | PlaybackEvent::StreamComplete => {}
            PlaybackEvent::Loading => {
                next.is_loading = true;
                next.is_playing = false;
                next.is_complete = false;
            }
            PlaybackEvent::Loaded => {
                next.is_loading = false;
            }
            PlaybackEvent::Playing => {
                next.is_playing = true;
                next.is_loading = false;
                next.is_complete = false;
            }
            PlaybackEvent::Paused => {
                next.is_playing = false;
            }
            PlaybackEvent::Complete => {
                next.is_complete = true;
                next.is_playing = false;
                next.is_loading = false;
            }
            PlaybackEvent::Buffering { buffering } => {
                next.is_loading = *buffering;
                if *buffering {
                    next.is_playing = false;
                }
            }
            PlaybackEvent::TimeUpdate {
                current_time,
                duration,
            } => {
                if current_time.is_finite() {
                    next.current_time = *current_time;
                }
                if let Some(duration) = duration.filter(|d| d.is_finite()) {
                    next.duration = Some(duration);
                }
            }
            PlaybackEvent::DurationChange { duration } => {
                next.duration = duration.filter(|d| d.is_finite());
            }
            PlaybackEvent::Error { message, .. } => {
                if event.is_fatal_error() {
                    next.error = Some(PlaybackError::fatal(message.clone()));
                    next.is_loading = false;
                    next.is_playing = false;
                }
            }
        }
        next
    }

    /// Same as [`apply`](Self::apply) for host-side failures.
    #[must_use]
    pub fn with_error(&self, error: PlaybackError) -> Self {
        Self {
            is_loading: false,
            is_playing: false,
            error: Some(error),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn phase(&self, has_source: bool) -> PlaybackPhase {
        if !has_source {
            PlaybackPhase::Idle
        } else if self.error.is_some() {
            PlaybackPhase::Error
        } else if self.is_complete {
            PlaybackPhase::Complete
        } else if self.is_playing {
            PlaybackPhase::Playing
        } else if self.is_loading && self.current_time > 0.0 {
            PlaybackPhase::Buffering
        } else if self.is_loading {
            PlaybackPhase::Loading
        } else {
            PlaybackPhase::Paused
        }
    }
}
