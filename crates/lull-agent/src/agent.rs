#![forbid(unsafe_code)]

use std::mem;

use lull_core::{PlaybackCommand, PlaybackError, PlaybackEvent};
use lull_hls::{
    ClientError, ClientEvent, ClientEventReceiver, ClientEventSender, ErrorCategory, ErrorDetails,
    LevelDetails, SegmentClient, SegmentClientFactory, SessionId, client_channel,
};
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::{
    classify::{Recovery, classify},
    config::AgentConfig,
    media::{MediaElement, MediaEvent},
    sink::EventSink,
};

/// Something the agent has to react to, as returned by
/// [`PlaybackAgent::next_input`].
#[derive(Debug)]
pub enum AgentInput {
    Media(MediaEvent),
    Client(SessionId, ClientEvent),
}

enum Source<C> {
    None,
    Native,
    Software(C),
}

/// Drives one media element for a sequence of sources.
///
/// The agent is not a task itself: its owner polls [`next_input`] and feeds
/// the result back through [`handle_input`], interleaved with commands.
///
/// [`next_input`]: Self::next_input
/// [`handle_input`]: Self::handle_input
pub struct PlaybackAgent<M, F, S>
where
    M: MediaElement,
    F: SegmentClientFactory,
    S: EventSink,
{
    config: AgentConfig,
    media: M,
    factory: F,
    sink: S,
    media_rx: broadcast::Receiver<MediaEvent>,
    media_closed: bool,
    client_tx: ClientEventSender,
    client_rx: ClientEventReceiver,
    session: SessionId,
    url: Option<Url>,
    source: Source<F::Client>,
    loaded: bool,
    stream_complete: bool,
    buffering: bool,
    /// Last finite playhead reported by the media element, in seconds.
    position: f64,
}

impl<M, F, S> PlaybackAgent<M, F, S>
where
    M: MediaElement,
    F: SegmentClientFactory,
    S: EventSink,
{
    pub fn new(config: AgentConfig, media: M, factory: F, sink: S) -> Self {
        let media_rx = media.subscribe();
        let (client_tx, client_rx) = client_channel(SessionId::default());
        Self {
            config,
            media,
            factory,
            sink,
            media_rx,
            media_closed: false,
            client_tx,
            client_rx,
            session: SessionId::default(),
            url: None,
            source: Source::None,
            loaded: false,
            stream_complete: false,
            buffering: false,
            position: 0.0,
        }
    }

    /// URL of the active session, cleared by teardown and fatal errors.
    pub fn current_url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Start a session for `url`. Loading the current URL again does nothing.
    pub fn load(&mut self, url: Url) {
        if self.url.as_ref() == Some(&url) {
            debug!(%url, "source already loaded");
            return;
        }

        self.teardown();
        self.url = Some(url.clone());
        self.loaded = false;
        self.stream_complete = false;
        self.buffering = false;
        self.position = 0.0;
        info!(%url, session = %self.session, "loading source");
        self.sink.emit(PlaybackEvent::Loading);

        if self.config.prefer_native
            && self
                .media
                .can_play_type(&self.config.native_mime)
                .is_positive()
        {
            debug!(%url, "using native playback");
            self.media.set_source(&url);
            self.source = Source::Native;
            return;
        }

        if !self.factory.is_supported() {
            self.fail(
                PlaybackError::unsupported("no native HLS playback and no software client")
                    .to_string(),
            );
            return;
        }

        match self.factory.create(self.client_tx.for_session(self.session)) {
            Ok(client) => {
                debug!(%url, "using software client");
                self.media.attach_buffer();
                client.load_source(url);
                self.source = Source::Software(client);
            }
            Err(error) => self.fail(PlaybackError::unsupported(error.to_string()).to_string()),
        }
    }

    /// Destroy the client, detach the media element and forget the URL.
    ///
    /// Events already queued for the old session are discarded.
    pub fn teardown(&mut self) {
        match mem::replace(&mut self.source, Source::None) {
            Source::Software(client) => {
                debug!(session = %self.session, "destroying client");
                client.destroy();
                self.media.detach();
            }
            Source::Native => self.media.detach(),
            Source::None => {}
        }
        self.url = None;
        self.session = self.session.next();
        self.drain();
    }

    pub fn handle_command(&mut self, command: PlaybackCommand) {
        trace!(command = command.tag(), "command");
        match command {
            PlaybackCommand::Load { url } => self.load(url),
            PlaybackCommand::Play => self.play(),
            PlaybackCommand::Pause => self.pause(),
            PlaybackCommand::Seek { time } => self.seek(time),
            PlaybackCommand::SetVolume { volume } => self.set_volume(volume),
        }
    }

    /// Rejection is reported as a non-fatal error.
    pub fn play(&mut self) {
        if let Err(error) = self.media.play() {
            warn!(%error, "play rejected");
            self.sink.emit(PlaybackEvent::warning(error.to_string()));
        }
    }

    pub fn pause(&mut self) {
        self.media.pause();
    }

    pub fn seek(&mut self, time: f64) {
        if !time.is_finite() {
            debug!(time, "ignoring seek to non-finite time");
            return;
        }
        self.media.seek(time);
    }

    pub fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            debug!(volume, "ignoring non-finite volume");
            return;
        }
        self.media.set_volume(volume.clamp(0.0, 1.0));
    }

    /// Wait for the next media or client event. Cancel safe.
    pub async fn next_input(&mut self) -> AgentInput {
        loop {
            tokio::select! {
                biased;
                Some((session, event)) = self.client_rx.recv() => {
                    return AgentInput::Client(session, event);
                }
                result = self.media_rx.recv(), if !self.media_closed => match result {
                    Ok(event) => return AgentInput::Media(event),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "media events lagged"),
                    Err(RecvError::Closed) => {
                        debug!("media event stream closed");
                        self.media_closed = true;
                    }
                },
                else => std::future::pending::<()>().await,
            }
        }
    }

    pub fn handle_input(&mut self, input: AgentInput) {
        match input {
            AgentInput::Media(event) => self.handle_media_event(event),
            AgentInput::Client(session, event) => self.handle_client_event(session, event),
        }
    }

    pub fn handle_client_event(&mut self, session: SessionId, event: ClientEvent) {
        if session != self.session || !matches!(self.source, Source::Software(_)) {
            trace!(%session, current = %self.session, "dropping stale client event");
            return;
        }

        match event {
            ClientEvent::ManifestParsed { variants } => {
                debug!(variants, "manifest parsed");
                if !self.loaded {
                    self.loaded = true;
                    self.sink.emit(PlaybackEvent::Loaded);
                }
            }
            ClientEvent::LevelLoaded(level) => self.level_loaded(&level),
            ClientEvent::FragmentLoaded(fragment) => {
                if let Err(error) = self.media.append(&fragment) {
                    self.client_error(ClientError::fatal(
                        ErrorCategory::Media,
                        ErrorDetails::BufferAppendError,
                        error.to_string(),
                    ));
                }
            }
            ClientEvent::EndOfStream => self.media.end_of_stream(),
            ClientEvent::Error(error) => self.client_error(error),
        }
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) {
        if matches!(self.source, Source::None) {
            trace!(?event, "media event without source");
            return;
        }

        match event {
            MediaEvent::CanPlay => {
                if matches!(self.source, Source::Native) && !self.loaded {
                    self.loaded = true;
                    self.sink.emit(PlaybackEvent::Loaded);
                }
            }
            MediaEvent::Playing => {
                self.set_buffering(false);
                self.sink.emit(PlaybackEvent::Playing);
            }
            MediaEvent::Pause => self.sink.emit(PlaybackEvent::Paused),
            MediaEvent::Waiting => self.set_buffering(true),
            MediaEvent::TimeUpdate { current_time } => {
                if !current_time.is_finite() {
                    debug!(current_time, "ignoring non-finite playhead");
                    return;
                }
                self.position = current_time;
                self.sink.emit(PlaybackEvent::TimeUpdate {
                    current_time,
                    duration: self.media.duration().filter(|d| d.is_finite()),
                });
            }
            MediaEvent::DurationChange { duration } => {
                let duration = duration.filter(|d| d.is_finite());
                self.sink.emit(PlaybackEvent::DurationChange { duration });
                // Native playback has no level events; a finite duration is the close signal.
                if matches!(self.source, Source::Native) && duration.is_some() {
                    self.stream_completed();
                }
            }
            MediaEvent::Ended => {
                self.buffering = false;
                self.sink.emit(PlaybackEvent::Complete);
            }
            MediaEvent::Error { message } => match self.source {
                Source::Software(_) => self.client_error(ClientError::fatal(
                    ErrorCategory::Media,
                    ErrorDetails::BufferAppendError,
                    message,
                )),
                Source::Native => self.fail(format!("{}: {message}", ErrorCategory::Media)),
                Source::None => {}
            },
        }
    }

    fn level_loaded(&mut self, level: &LevelDetails) {
        trace!(url = %level.url, live = level.live, fragments = level.fragments, "level loaded");
        if let Some(duration) = level.duration.filter(|d| d.is_finite()) {
            self.sink.emit(PlaybackEvent::DurationChange {
                duration: Some(duration),
            });
        }
        if !level.live {
            self.stream_completed();
        }
    }

    fn client_error(&mut self, error: ClientError) {
        let recovery = classify(&error);
        let Source::Software(client) = &self.source else {
            return;
        };

        match recovery {
            Recovery::RestartLoad => {
                warn!(category = %error.category, %error, "network error, restarting load");
                client.restart_load();
            }
            Recovery::RecoverMedia => {
                warn!(category = %error.category, %error, "media error, recovering");
                self.media.reset_buffer();
                client.recover_media_error(self.position);
            }
            Recovery::Buffering => self.set_buffering(true),
            Recovery::Ignore => debug!(%error, "non-fatal client error"),
            Recovery::Propagate(message) => self.fail(message),
        }
    }

    fn stream_completed(&mut self) {
        if !self.stream_complete {
            self.stream_complete = true;
            info!(session = %self.session, "stream complete");
            self.sink.emit(PlaybackEvent::StreamComplete);
        }
    }

    fn set_buffering(&mut self, buffering: bool) {
        if self.buffering != buffering {
            self.buffering = buffering;
            self.sink.emit(PlaybackEvent::Buffering { buffering });
        }
    }

    fn fail(&mut self, message: String) {
        warn!(url = ?self.url, %message, "fatal playback error");
        self.teardown();
        self.sink.emit(PlaybackEvent::fatal_error(message));
    }

    fn drain(&mut self) {
        loop {
            match self.media_rx.try_recv() {
                Ok(event) => trace!(?event, "dropping stale media event"),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        while let Ok((session, _)) = self.client_rx.try_recv() {
            trace!(%session, "dropping stale client event");
        }
    }
}

impl<M, F, S> Drop for PlaybackAgent<M, F, S>
where
    M: MediaElement,
    F: SegmentClientFactory,
    S: EventSink,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
