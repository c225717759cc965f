#![forbid(unsafe_code)]

use std::time::Duration;

use lull_agent::{MediaElement, PlaybackAgent};
use lull_core::{PlaybackEvent, PlayerOptions};
use lull_hls::SegmentClientFactory;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use url::Url;

use crate::{
    config::ControllerConfig,
    controller::{Control, PlayerHandle, delegate_controller},
    timer::Deferred,
    tracker::StateTracker,
};

type Agent<M, F> = PlaybackAgent<M, F, mpsc::UnboundedSender<PlaybackEvent>>;

struct DirectCore<M: MediaElement, F: SegmentClientFactory> {
    agent: Agent<M, F>,
    events: mpsc::UnboundedReceiver<PlaybackEvent>,
    url: Option<Url>,
    auto_play: bool,
    retry_delay: Duration,
    /// Pending reinitialization of a retried source.
    retry: Deferred<Url>,
    tracker: StateTracker,
}

impl<M: MediaElement, F: SegmentClientFactory> DirectCore<M, F> {
    fn set_playlist_url(&mut self, url: Option<Url>) {
        if url == self.url {
            debug!(url = ?url, "playlist unchanged");
            return;
        }

        info!(url = ?url, "playlist changed");
        self.retry.clear();
        self.url = url.clone();
        self.tracker.reset(url.is_some());
        self.agent.teardown();
        self.drain_events();
        if let Some(url) = url {
            self.agent.load(url);
        }
    }

    fn retry(&mut self) {
        let Some(url) = self.url.clone() else {
            debug!("no source to retry");
            return;
        };
        if self.retry.is_armed() {
            debug!(%url, "retry already in flight");
            return;
        }

        info!(%url, "retrying");
        self.tracker.reset(true);
        self.agent.teardown();
        self.drain_events();
        self.retry.arm(self.retry_delay, url);
    }

    fn reinitialize(&mut self, url: Url) {
        if self.url.as_ref() != Some(&url) {
            return;
        }
        debug!(%url, "reinitializing");
        self.drain_events();
        self.agent.load(url);
    }

    fn handle_event(&mut self, event: PlaybackEvent) {
        if self.url.is_none() {
            trace!(event = event.tag(), "no source, ignoring event");
            return;
        }
        let loaded = event == PlaybackEvent::Loaded;
        self.tracker.apply(&event);
        if loaded && self.auto_play {
            self.agent.play();
        }
    }

    fn handle_control(&mut self, control: Control) {
        match control {
            Control::SetPlaylistUrl(url) => self.set_playlist_url(url),
            Control::Retry => self.retry(),
            Control::SetVolume(volume) => self.agent.set_volume(volume),
            control if self.url.is_none() => {
                debug!(?control, "no source, dropping command");
            }
            Control::Play => self.agent.play(),
            Control::Pause => self.agent.pause(),
            Control::Seek(time) => self.agent.seek(time),
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            trace!(event = event.tag(), "dropping stale event");
        }
    }
}

/// Controller owning its [`PlaybackAgent`] and media element.
///
/// Every source change or retry tears the agent's session down and starts a
/// fresh one; the media element itself lives as long as the player.
pub struct DirectPlayer {
    handle: PlayerHandle,
}

impl DirectPlayer {
    /// Start the controller task. Must be called within a tokio runtime.
    pub fn spawn<M, F>(options: PlayerOptions, config: ControllerConfig, media: M, factory: F) -> Self
    where
        M: MediaElement,
        F: SegmentClientFactory,
    {
        let PlayerOptions {
            playlist_url,
            auto_play,
            callbacks,
        } = options;
        let cancel = CancellationToken::new();
        let (sink, events) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::channel(config.command_channel_capacity.max(1));

        let mut core = DirectCore {
            agent: PlaybackAgent::new(config.agent, media, factory, sink),
            events,
            url: None,
            auto_play,
            retry_delay: config.retry_delay,
            retry: Deferred::default(),
            tracker: StateTracker::new(callbacks, playlist_url.is_some(), cancel.clone()),
        };
        let state = core.tracker.subscribe();
        core.set_playlist_url(playlist_url);
        let task = tokio::spawn(run(core, control_rx, cancel.clone()));

        Self {
            handle: PlayerHandle::new(control_tx, state, cancel, task),
        }
    }

    /// Stop the controller and wait until the media element is released.
    pub async fn shutdown(self) {
        self.handle.shutdown().await;
    }
}

delegate_controller!(DirectPlayer);

async fn run<M, F>(
    mut core: DirectCore<M, F>,
    mut control_rx: mpsc::Receiver<Control>,
    cancel: CancellationToken,
) where
    M: MediaElement,
    F: SegmentClientFactory,
{
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            control = control_rx.recv() => match control {
                Some(control) => core.handle_control(control),
                None => break,
            },
            Some(event) = core.events.recv() => core.handle_event(event),
            url = core.retry.fired() => core.reinitialize(url),
            input = core.agent.next_input() => core.agent.handle_input(input),
        }
    }
    debug!("direct controller stopped");
    core.agent.teardown();
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lull_core::{PlaybackError, PlaybackState, PlayerCallbacks};
    use lull_hls::{
        ClientError, ClientEvent, ErrorCategory, ErrorDetails, LevelDetails,
    };
    use lull_test_utils::{ClientCall, FakeMediaElement, MediaCall, ScriptedClientFactory};
    use parking_lot::Mutex;
    use rstest::*;

    use super::*;
    use crate::controller::PlaybackController;

    fn url(name: &str) -> Url {
        Url::parse(&format!("https://cdn.test/{name}/playlist.m3u8")).unwrap()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    fn vod_level(name: &str, duration: f64) -> ClientEvent {
        ClientEvent::LevelLoaded(LevelDetails {
            url: url(name),
            live: false,
            total_duration: Duration::from_secs_f64(duration),
            duration: Some(duration),
            target_duration: Duration::from_secs(10),
            fragments: 18,
        })
    }

    fn fatal(category: ErrorCategory, details: ErrorDetails) -> ClientEvent {
        ClientEvent::Error(ClientError::fatal(category, details, "boom"))
    }

    struct Harness {
        player: DirectPlayer,
        media: FakeMediaElement,
        factory: ScriptedClientFactory,
        log: Arc<Mutex<Vec<String>>>,
    }

    fn harness(source: Option<&str>, auto_play: bool) -> Harness {
        let media = FakeMediaElement::software();
        let factory = ScriptedClientFactory::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let callbacks = PlayerCallbacks::new()
            .on_playback_start({
                let log = Arc::clone(&log);
                move || log.lock().push("start".to_string())
            })
            .on_stream_complete({
                let log = Arc::clone(&log);
                move || log.lock().push("stream-complete".to_string())
            })
            .on_error({
                let log = Arc::clone(&log);
                move |e| log.lock().push(format!("error {e}"))
            });
        let player = DirectPlayer::spawn(
            PlayerOptions::new(source.map(url))
                .with_auto_play(auto_play)
                .with_callbacks(callbacks),
            ControllerConfig::default(),
            media.clone(),
            factory.clone(),
        );
        Harness {
            player,
            media,
            factory,
            log,
        }
    }

    #[rstest]
    #[timeout(Duration::from_secs(5))]
    #[tokio::test(start_paused = true)]
    async fn auto_plays_after_manifest() {
        let h = harness(Some("a"), true);
        assert_eq!(h.player.state(), PlaybackState::loading());

        settle().await;
        assert_eq!(h.factory.calls(0), vec![ClientCall::LoadSource(url("a"))]);

        h.factory.send(0, ClientEvent::ManifestParsed { variants: 2 });
        h.factory.send(0, vod_level("a", 180.0));
        settle().await;

        let state = h.player.state();
        assert!(state.is_playing);
        assert_eq!(state.duration, Some(180.0));
        assert_eq!(*h.log.lock(), vec!["stream-complete", "start"]);
    }

    #[rstest]
    #[timeout(Duration::from_secs(5))]
    #[tokio::test(start_paused = true)]
    async fn same_url_is_noop() {
        let h = harness(Some("a"), false);
        settle().await;

        h.player.set_playlist_url(Some(url("a")));
        settle().await;

        assert_eq!(h.factory.created(), 1);
        assert_eq!(h.factory.calls(0), vec![ClientCall::LoadSource(url("a"))]);
    }

    #[rstest]
    #[timeout(Duration::from_secs(5))]
    #[tokio::test(start_paused = true)]
    async fn switching_source_tears_down_once_and_drops_stale_events() {
        let h = harness(Some("a"), false);
        settle().await;

        h.player.set_playlist_url(Some(url("b")));
        settle().await;
        h.factory.send(0, vod_level("a", 60.0));
        settle().await;

        assert_eq!(h.factory.created(), 2);
        assert_eq!(
            h.factory.calls(0),
            vec![ClientCall::LoadSource(url("a")), ClientCall::Destroy]
        );
        assert_eq!(h.factory.calls(1), vec![ClientCall::LoadSource(url("b"))]);
        assert_eq!(h.player.state(), PlaybackState::loading());
        assert!(h.log.lock().is_empty());
    }

    #[rstest]
    #[timeout(Duration::from_secs(5))]
    #[tokio::test(start_paused = true)]
    async fn network_failure_restarts_without_error() {
        let h = harness(Some("a"), false);
        settle().await;

        h.factory
            .send(0, fatal(ErrorCategory::Network, ErrorDetails::FragLoadError));
        settle().await;

        assert_eq!(
            h.factory.calls(0),
            vec![ClientCall::LoadSource(url("a")), ClientCall::RestartLoad]
        );
        assert_eq!(h.player.state().error, None);
    }

    #[rstest]
    #[timeout(Duration::from_secs(5))]
    #[tokio::test(start_paused = true)]
    async fn retry_starts_over_once() {
        let h = harness(Some("a"), false);
        settle().await;
        h.factory
            .send(0, fatal(ErrorCategory::Other, ErrorDetails::LevelParsingError));
        settle().await;
        assert_eq!(
            h.player.state().error,
            Some(PlaybackError::fatal("otherError: levelParsingError"))
        );

        h.player.retry();
        h.player.retry();
        settle().await;

        assert_eq!(h.player.state(), PlaybackState::loading());
        assert_eq!(h.factory.created(), 2);
        assert_eq!(h.factory.calls(1), vec![ClientCall::LoadSource(url("a"))]);
        assert_eq!(*h.log.lock(), vec!["error otherError: levelParsingError"]);
    }

    #[rstest]
    #[timeout(Duration::from_secs(5))]
    #[tokio::test(start_paused = true)]
    async fn idle_commands_are_noops() {
        let h = harness(None, true);

        h.player.seek(45.0);
        h.player.play();
        h.player.retry();
        settle().await;

        assert_eq!(h.player.state(), PlaybackState::idle());
        assert!(h.media.calls().is_empty());
        assert_eq!(h.factory.created(), 0);
    }

    #[rstest]
    #[timeout(Duration::from_secs(5))]
    #[tokio::test(start_paused = true)]
    async fn clearing_source_goes_idle() {
        let h = harness(Some("a"), false);
        settle().await;

        h.player.set_playlist_url(None);
        settle().await;

        assert_eq!(h.player.state(), PlaybackState::idle());
        assert_eq!(h.media.count(&MediaCall::Detach), 1);
        assert_eq!(
            h.factory.calls(0),
            vec![ClientCall::LoadSource(url("a")), ClientCall::Destroy]
        );
    }

    #[rstest]
    #[timeout(Duration::from_secs(5))]
    #[tokio::test(start_paused = true)]
    async fn shutdown_releases_media() {
        let h = harness(Some("a"), false);
        settle().await;

        h.player.shutdown().await;

        assert_eq!(h.media.count(&MediaCall::Detach), 1);
        assert_eq!(h.media.subscribers(), 0);
        assert!(!h.factory.send(0, ClientEvent::EndOfStream));
    }
}
