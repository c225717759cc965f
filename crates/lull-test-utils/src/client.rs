//! Segment client double driven by the test.

use std::sync::Arc;

use lull_hls::{
    ClientEvent, ClientEventSender, HlsResult, SegmentClient, SegmentClientFactory, SessionId,
};
use parking_lot::Mutex;
use url::Url;

#[derive(Clone, Debug, PartialEq)]
pub enum ClientCall {
    LoadSource(Url),
    RestartLoad,
    /// Playhead position the recovery rewinds to.
    RecoverMediaError(f64),
    Destroy,
}

struct Session {
    events: ClientEventSender,
    calls: Arc<Mutex<Vec<ClientCall>>>,
}

/// Client that only records calls; the test plays the network.
pub struct ScriptedClient {
    calls: Arc<Mutex<Vec<ClientCall>>>,
}

impl SegmentClient for ScriptedClient {
    fn load_source(&self, url: Url) {
        self.calls.lock().push(ClientCall::LoadSource(url));
    }

    fn restart_load(&self) {
        self.calls.lock().push(ClientCall::RestartLoad);
    }

    fn recover_media_error(&self, position: f64) {
        self.calls.lock().push(ClientCall::RecoverMediaError(position));
    }

    fn destroy(&self) {
        self.calls.lock().push(ClientCall::Destroy);
    }
}

/// Factory remembering every client it created, oldest first.
#[derive(Clone, Default)]
pub struct ScriptedClientFactory {
    sessions: Arc<Mutex<Vec<Session>>>,
    unsupported: bool,
}

impl ScriptedClientFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory for an environment without software playback.
    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    /// Number of clients created so far.
    #[must_use]
    pub fn created(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Calls received by client `index`.
    #[must_use]
    pub fn calls(&self, index: usize) -> Vec<ClientCall> {
        self.sessions.lock()[index].calls.lock().clone()
    }

    #[must_use]
    pub fn session(&self, index: usize) -> SessionId {
        self.sessions.lock()[index].events.session()
    }

    /// Report `event` as client `index`. Returns `false` if nobody listens.
    pub fn send(&self, index: usize, event: ClientEvent) -> bool {
        self.sessions.lock()[index].events.send(event)
    }

    /// Report `event` as the newest client.
    pub fn send_latest(&self, event: ClientEvent) -> bool {
        let sessions = self.sessions.lock();
        sessions.last().is_some_and(|s| s.events.send(event))
    }
}

impl SegmentClientFactory for ScriptedClientFactory {
    type Client = ScriptedClient;

    fn is_supported(&self) -> bool {
        !self.unsupported
    }

    fn create(&self, events: ClientEventSender) -> HlsResult<ScriptedClient> {
        let calls = Arc::new(Mutex::new(Vec::new()));
        self.sessions.lock().push(Session {
            events,
            calls: Arc::clone(&calls),
        });
        Ok(ScriptedClient { calls })
    }
}
