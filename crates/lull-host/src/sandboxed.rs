#![forbid(unsafe_code)]

use std::time::Duration;

use lull_bridge::{RenderingSurface, decode_event, encode_command};
use lull_core::{PlaybackCommand, PlaybackError, PlaybackEvent, PlaybackState, PlayerOptions};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::{
    config::ControllerConfig,
    controller::{Control, PlayerHandle, delegate_controller},
    timer::Deferred,
    tracker::StateTracker,
};

/// Synchronous half of the sandboxed controller.
///
/// Performs the readiness handshake and translates between application
/// calls, bridge messages and [`PlaybackState`]. Nothing is sent before the
/// agent's `ready`; a source requested earlier is kept in `pending_url`.
///
/// Every `load` sent opens a new agent session. Events arriving before that
/// session's `loading` belong to a replaced session and are dropped.
pub struct SandboxedCore<S: RenderingSurface> {
    surface: S,
    settle_delay: Duration,
    auto_play: bool,
    ready: bool,
    url: Option<Url>,
    pending_url: Option<Url>,
    /// Last URL the agent was told to load and has not failed on.
    agent_url: Option<Url>,
    /// `load` commands whose `loading` has not come back yet.
    loads_in_flight: usize,
    tracker: StateTracker,
    deferred_play: Deferred<()>,
}

impl<S: RenderingSurface> SandboxedCore<S> {
    pub fn new(
        surface: S,
        options: PlayerOptions,
        config: &ControllerConfig,
        cancel: CancellationToken,
    ) -> Self {
        let PlayerOptions {
            playlist_url,
            auto_play,
            callbacks,
        } = options;
        Self {
            surface,
            settle_delay: config.settle_delay,
            auto_play,
            ready: false,
            pending_url: playlist_url.clone(),
            tracker: StateTracker::new(callbacks, playlist_url.is_some(), cancel),
            url: playlist_url,
            agent_url: None,
            loads_in_flight: 0,
            deferred_play: Deferred::default(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn state(&self) -> &PlaybackState {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &StateTracker {
        &self.tracker
    }

    /// Whether an auto-play is waiting for the settle delay.
    pub fn has_deferred_play(&self) -> bool {
        self.deferred_play.is_armed()
    }

    pub fn set_playlist_url(&mut self, url: Option<Url>) {
        if url == self.url {
            debug!(url = ?url, "playlist unchanged");
            return;
        }

        info!(url = ?url, "playlist changed");
        self.url = url.clone();
        self.deferred_play.clear();
        self.tracker.reset(url.is_some());

        match url {
            Some(url) => self.request_load(url),
            None => {
                self.pending_url = None;
                if self.ready {
                    self.send(&PlaybackCommand::Pause);
                }
            }
        }
    }

    pub fn play(&mut self) {
        self.forward(PlaybackCommand::Play);
    }

    pub fn pause(&mut self) {
        self.forward(PlaybackCommand::Pause);
    }

    pub fn seek(&mut self, time: f64) {
        self.forward(PlaybackCommand::Seek { time });
    }

    pub fn set_volume(&mut self, volume: f64) {
        if self.ready {
            self.send(&PlaybackCommand::SetVolume { volume });
        }
    }

    /// Reload the current source after a fatal error.
    pub fn retry(&mut self) {
        let Some(url) = self.url.clone() else {
            debug!("no source to retry");
            return;
        };
        if !self.tracker.state().has_error() {
            debug!(%url, "retry ignored, no error");
            return;
        }

        info!(%url, "retrying");
        self.deferred_play.clear();
        self.tracker.reset(true);
        self.request_load(url);
    }

    /// Apply one message from the agent.
    pub fn handle_message(&mut self, text: &str) {
        let event = match decode_event(text) {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(error) => {
                warn!(%error, "dropping malformed agent message");
                return;
            }
        };

        if event == PlaybackEvent::Ready {
            self.on_ready();
            return;
        }
        if !self.ready {
            trace!(event = event.tag(), "event before ready, ignoring");
            return;
        }
        if self.loads_in_flight > 0 {
            if event == PlaybackEvent::Loading {
                self.loads_in_flight -= 1;
            }
            if self.loads_in_flight > 0 || event != PlaybackEvent::Loading {
                trace!(
                    event = event.tag(),
                    pending = self.loads_in_flight,
                    "event from a replaced session"
                );
                return;
            }
        }
        if event.is_fatal_error() {
            // The agent forgets a source it failed on.
            self.agent_url = None;
        }
        if self.url.is_none() {
            trace!(event = event.tag(), "no source, ignoring event");
            return;
        }
        self.tracker.apply(&event);
    }

    /// The agent's message stream ended.
    pub fn bridge_closed(&mut self) {
        self.ready = false;
        self.loads_in_flight = 0;
        self.deferred_play.clear();
        if self.url.is_some() {
            self.tracker
                .fail(PlaybackError::bridge("rendering surface closed"));
        }
    }

    /// Send the auto-play scheduled after a load.
    pub fn fire_deferred_play(&mut self) {
        if self.ready && self.url.is_some() {
            self.send(&PlaybackCommand::Play);
        }
    }

    pub fn destroy(&mut self) {
        self.deferred_play.clear();
        self.surface.destroy();
    }

    pub(crate) fn handle_control(&mut self, control: Control) {
        match control {
            Control::Play => self.play(),
            Control::Pause => self.pause(),
            Control::Seek(time) => self.seek(time),
            Control::SetVolume(volume) => self.set_volume(volume),
            Control::SetPlaylistUrl(url) => self.set_playlist_url(url),
            Control::Retry => self.retry(),
        }
    }

    fn on_ready(&mut self) {
        if self.ready {
            debug!("duplicate ready");
            return;
        }
        info!("agent ready");
        self.ready = true;
        if let Some(url) = self.pending_url.take() {
            self.request_load(url);
        }
    }

    fn request_load(&mut self, url: Url) {
        if !self.ready {
            debug!(%url, "agent not ready, load deferred");
            self.pending_url = Some(url);
            return;
        }

        if self.agent_url.as_ref() == Some(&url) {
            // The agent still holds this source and would ignore a second load.
            // While its `loading` is outstanding the agent reports `loaded` itself.
            debug!(%url, "source still loaded by agent");
            if self.loads_in_flight == 0 {
                self.tracker.apply(&PlaybackEvent::Loaded);
            }
        } else if self.send(&PlaybackCommand::Load { url: url.clone() }) {
            self.agent_url = Some(url);
            self.loads_in_flight += 1;
        } else {
            return;
        }

        if self.auto_play {
            self.deferred_play.arm(self.settle_delay, ());
        }
    }

    fn forward(&mut self, command: PlaybackCommand) {
        if !self.ready {
            debug!(command = command.tag(), "agent not ready, dropping command");
            return;
        }
        if self.url.is_none() {
            debug!(command = command.tag(), "no source, dropping command");
            return;
        }
        self.send(&command);
    }

    fn send(&mut self, command: &PlaybackCommand) -> bool {
        let result = encode_command(command).and_then(|message| self.surface.post(message));
        match result {
            Ok(()) => {
                trace!(command = command.tag(), "sent");
                true
            }
            Err(error) => {
                warn!(command = command.tag(), %error, "bridge unavailable");
                self.tracker.fail(PlaybackError::bridge(error.to_string()));
                false
            }
        }
    }
}

/// Controller delegating playback to an agent behind a [`RenderingSurface`].
///
/// The surface persists across source changes and is destroyed with the
/// player.
pub struct SandboxedPlayer {
    handle: PlayerHandle,
}

impl SandboxedPlayer {
    /// Start the controller task. Must be called within a tokio runtime.
    pub fn spawn<S: RenderingSurface>(
        options: PlayerOptions,
        config: ControllerConfig,
        mut surface: S,
    ) -> Self {
        let cancel = CancellationToken::new();
        let inbound = surface
            .take_inbound()
            .unwrap_or_else(|| mpsc::unbounded_channel().1);
        let (control_tx, control_rx) = mpsc::channel(config.command_channel_capacity.max(1));

        let core = SandboxedCore::new(surface, options, &config, cancel.clone());
        let state = core.tracker.subscribe();
        let task = tokio::spawn(run(core, inbound, control_rx, cancel.clone()));

        Self {
            handle: PlayerHandle::new(control_tx, state, cancel, task),
        }
    }

    /// Stop the controller and wait for the surface to be destroyed.
    pub async fn shutdown(self) {
        self.handle.shutdown().await;
    }
}

delegate_controller!(SandboxedPlayer);

async fn run<S: RenderingSurface>(
    mut core: SandboxedCore<S>,
    mut inbound: mpsc::UnboundedReceiver<String>,
    mut control_rx: mpsc::Receiver<Control>,
    cancel: CancellationToken,
) {
    let mut inbound_open = true;
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            control = control_rx.recv() => match control {
                Some(control) => core.handle_control(control),
                None => break,
            },
            message = inbound.recv(), if inbound_open => match message {
                Some(text) => core.handle_message(&text),
                None => {
                    inbound_open = false;
                    core.bridge_closed();
                }
            },
            () = core.deferred_play.fired() => core.fire_deferred_play(),
        }
    }
    debug!("sandboxed controller stopped");
    core.destroy();
}
