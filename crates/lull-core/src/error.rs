use thiserror::Error;

/// Terminal playback failure surfaced to the application.
///
/// Stored inside [`PlaybackState`](crate::PlaybackState) snapshots, hence `Clone`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaybackError {
    /// Fatal error reported by the playback agent.
    #[error("{message}")]
    Fatal { message: String },

    /// Neither native playback nor the software client is available.
    #[error("unsupported environment: {message}")]
    Unsupported { message: String },

    /// The message channel to the rendering surface is gone.
    #[error("bridge unavailable: {message}")]
    Bridge { message: String },
}

impl PlaybackError {
    pub fn fatal<S: Into<String>>(message: S) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    pub fn bridge<S: Into<String>>(message: S) -> Self {
        Self::Bridge {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Fatal { message } | Self::Unsupported { message } | Self::Bridge { message } => {
                message
            }
        }
    }
}
