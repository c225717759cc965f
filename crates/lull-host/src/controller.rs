#![forbid(unsafe_code)]

use lull_core::PlaybackState;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};
use url::Url;

/// Application-facing playback control, identical for both host variants.
///
/// Every call is asynchronous in effect: it is queued to the controller task
/// and its consequences show up in [`state`](Self::state) later.
pub trait PlaybackController: Send + Sync {
    fn play(&self);

    fn pause(&self);

    /// Move the playhead to `time` seconds. No-op without a source.
    fn seek(&self, time: f64);

    fn set_volume(&self, volume: f64);

    /// Switch source. `None` stops playback and returns to idle.
    fn set_playlist_url(&self, url: Option<Url>);

    /// Start the current source over after a failure.
    fn retry(&self);

    /// Latest published state.
    fn state(&self) -> PlaybackState;

    /// Subscribe to state changes.
    fn watch(&self) -> watch::Receiver<PlaybackState>;
}

/// Application → controller task message.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Control {
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
    SetPlaylistUrl(Option<Url>),
    Retry,
}

/// Handle to a running controller task.
///
/// Dropping it cancels the task; [`shutdown`](Self::shutdown) also waits
/// for teardown to finish.
pub struct PlayerHandle {
    control: mpsc::Sender<Control>,
    state: watch::Receiver<PlaybackState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    pub(crate) fn new(
        control: mpsc::Sender<Control>,
        state: watch::Receiver<PlaybackState>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            control,
            state,
            cancel,
            task: Some(task),
        }
    }

    /// Stop the controller and wait until its media and surface are released.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(error) = task.await
        {
            warn!(%error, "controller task failed");
        }
    }

    fn send(&self, control: Control) {
        trace!(?control, "control");
        if let Err(error) = self.control.try_send(control) {
            warn!(%error, "controller not accepting commands");
        }
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl PlaybackController for PlayerHandle {
    fn play(&self) {
        self.send(Control::Play);
    }

    fn pause(&self) {
        self.send(Control::Pause);
    }

    fn seek(&self, time: f64) {
        self.send(Control::Seek(time));
    }

    fn set_volume(&self, volume: f64) {
        self.send(Control::SetVolume(volume));
    }

    fn set_playlist_url(&self, url: Option<Url>) {
        self.send(Control::SetPlaylistUrl(url));
    }

    fn retry(&self) {
        self.send(Control::Retry);
    }

    fn state(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }
}

/// Implement [`PlaybackController`] for a player wrapping a `handle` field.
macro_rules! delegate_controller {
    ($player:ty) => {
        impl $crate::controller::PlaybackController for $player {
            fn play(&self) {
                $crate::controller::PlaybackController::play(&self.handle);
            }

            fn pause(&self) {
                $crate::controller::PlaybackController::pause(&self.handle);
            }

            fn seek(&self, time: f64) {
                $crate::controller::PlaybackController::seek(&self.handle, time);
            }

            fn set_volume(&self, volume: f64) {
                $crate::controller::PlaybackController::set_volume(&self.handle, volume);
            }

            fn set_playlist_url(&self, url: Option<::url::Url>) {
                $crate::controller::PlaybackController::set_playlist_url(&self.handle, url);
            }

            fn retry(&self) {
                $crate::controller::PlaybackController::retry(&self.handle);
            }

            fn state(&self) -> ::lull_core::PlaybackState {
                $crate::controller::PlaybackController::state(&self.handle)
            }

            fn watch(&self) -> ::tokio::sync::watch::Receiver<::lull_core::PlaybackState> {
                $crate::controller::PlaybackController::watch(&self.handle)
            }
        }
    };
}

pub(crate) use delegate_controller;
