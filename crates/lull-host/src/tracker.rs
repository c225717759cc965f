#![forbid(unsafe_code)]

use lull_core::{PlaybackError, PlaybackEvent, PlaybackState, PlayerCallbacks};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Owns a controller's [`PlaybackState`], publishes every change and calls
/// the application hooks.
///
/// Goes silent once `cancel` fires, so a controller being torn down cannot
/// reach the application any more.
pub struct StateTracker {
    state: PlaybackState,
    has_source: bool,
    callbacks: PlayerCallbacks,
    tx: watch::Sender<PlaybackState>,
    cancel: CancellationToken,
}

impl StateTracker {
    pub fn new(callbacks: PlayerCallbacks, has_source: bool, cancel: CancellationToken) -> Self {
        let state = PlaybackState::for_source(has_source);
        let (tx, _) = watch::channel(state.clone());
        Self {
            state,
            has_source,
            callbacks,
            tx,
            cancel,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.tx.subscribe()
    }

    /// Start over for a new source (or none).
    pub fn reset(&mut self, has_source: bool) {
        self.has_source = has_source;
        self.publish(PlaybackState::for_source(has_source));
    }

    /// Apply an agent event and fire the matching hook.
    pub fn apply(&mut self, event: &PlaybackEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        if self.state.has_error() {
            trace!(event = event.tag(), "state frozen by error");
            return;
        }

        let next = self.state.apply(event);
        self.publish(next);
        self.notify(event);
    }

    /// Enter the error state for a failure detected on the host side.
    pub fn fail(&mut self, error: PlaybackError) {
        if self.cancel.is_cancelled() || self.state.has_error() {
            return;
        }
        warn!(%error, "playback failed");
        self.publish(self.state.with_error(error.clone()));
        self.callbacks.failed(&error);
    }

    fn notify(&self, event: &PlaybackEvent) {
        let callbacks = &self.callbacks;
        match event {
            PlaybackEvent::Playing => callbacks.playback_started(),
            PlaybackEvent::Complete => callbacks.playback_completed(),
            PlaybackEvent::StreamComplete => callbacks.stream_completed(),
            PlaybackEvent::Buffering { buffering } => callbacks.buffering_changed(*buffering),
            PlaybackEvent::TimeUpdate {
                current_time,
                duration,
            } => callbacks.time_updated(*current_time, *duration),
            PlaybackEvent::Error { message, .. } => {
                if let Some(error) = &self.state.error {
                    callbacks.failed(error);
                } else {
                    debug!(%message, "non-fatal playback error");
                }
            }
            PlaybackEvent::Ready
            | PlaybackEvent::Loading
            | PlaybackEvent::Loaded
            | PlaybackEvent::Paused
            | PlaybackEvent::DurationChange { .. } => {}
        }
    }

    fn publish(&mut self, next: PlaybackState) {
        let before = self.state.phase(self.has_source);
        let after = next.phase(self.has_source);
        if before != after {
            debug!(?before, ?after, "playback phase");
        }
        self.state = next;
        let state = &self.state;
        self.tx.send_if_modified(|current| {
            if current == state {
                false
            } else {
                *current = state.clone();
                true
            }
        });
    }
}
