#![forbid(unsafe_code)]

use std::{fmt, time::Duration};

use bytes::Bytes;
use tokio::sync::mpsc;
use url::Url;

/// Identifies the agent session a client belongs to.
///
/// Bumped on every source change; events carrying an older id are stale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl SessionId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse failure class used by the agent to pick a recovery primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Network,
    Media,
    Other,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Network => "networkError",
            Self::Media => "mediaError",
            Self::Other => "otherError",
        })
    }
}

/// What exactly failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorDetails {
    ManifestLoadError,
    ManifestParsingError,
    LevelLoadError,
    LevelParsingError,
    FragLoadError,
    BufferAppendError,
    BufferStalledError,
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ManifestLoadError => "manifestLoadError",
            Self::ManifestParsingError => "manifestParsingError",
            Self::LevelLoadError => "levelLoadError",
            Self::LevelParsingError => "levelParsingError",
            Self::FragLoadError => "fragLoadError",
            Self::BufferAppendError => "bufferAppendError",
            Self::BufferStalledError => "bufferStalledError",
        })
    }
}

/// Error reported by a segment client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientError {
    pub category: ErrorCategory,
    pub details: ErrorDetails,
    pub fatal: bool,
    /// Underlying cause, for logs.
    pub message: String,
}

impl ClientError {
    pub fn fatal<S: Into<String>>(category: ErrorCategory, details: ErrorDetails, message: S) -> Self {
        Self {
            category,
            details,
            fatal: true,
            message: message.into(),
        }
    }

    pub fn non_fatal<S: Into<String>>(
        category: ErrorCategory,
        details: ErrorDetails,
        message: S,
    ) -> Self {
        Self {
            category,
            details,
            fatal: false,
            message: message.into(),
        }
    }

    /// `"<category>: <details>"`, the text propagated to the host.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}: {}", self.category, self.details)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.summary(), self.message)
    }
}

/// Snapshot of a freshly loaded level playlist.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDetails {
    pub url: Url,
    /// No `#EXT-X-ENDLIST` seen yet.
    pub live: bool,
    /// Sum of listed fragment durations.
    pub total_duration: Duration,
    /// Duration to report, `None` while it must be treated as infinite.
    pub duration: Option<f64>,
    pub target_duration: Duration,
    pub fragments: usize,
}

/// One downloaded media fragment, ready to append.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub sequence: u64,
    pub duration: Duration,
    pub url: Url,
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent {
    /// Manifest fetched and parsed; `variants` is 1 for a plain media playlist.
    ManifestParsed { variants: usize },
    LevelLoaded(LevelDetails),
    FragmentLoaded(Fragment),
    /// Every fragment of a closed playlist was delivered.
    EndOfStream,
    Error(ClientError),
}

pub type ClientEventReceiver = mpsc::UnboundedReceiver<(SessionId, ClientEvent)>;

/// Session-tagging sender handed to a client at creation.
#[derive(Clone, Debug)]
pub struct ClientEventSender {
    session: SessionId,
    tx: mpsc::UnboundedSender<(SessionId, ClientEvent)>,
}

impl ClientEventSender {
    #[must_use]
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<(SessionId, ClientEvent)>) -> Self {
        Self { session, tx }
    }

    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Returns `false` once the receiving side is gone.
    pub fn send(&self, event: ClientEvent) -> bool {
        self.tx.send((self.session, event)).is_ok()
    }

    /// Same channel, different session.
    #[must_use]
    pub fn for_session(&self, session: SessionId) -> Self {
        Self {
            session,
            tx: self.tx.clone(),
        }
    }
}

/// Create the channel a client reports on.
pub fn client_channel(session: SessionId) -> (ClientEventSender, ClientEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ClientEventSender::new(session, tx), rx)
}
