#![forbid(unsafe_code)]

use lull_hls::{ClientError, ErrorCategory, ErrorDetails};

/// What the agent does about a client-reported error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// Resume loading from the current position.
    RestartLoad,
    /// Reset the media buffer and re-deliver from the last fragment.
    RecoverMedia,
    /// Stalled: report buffering, keep everything alive.
    Buffering,
    /// Log only.
    Ignore,
    /// Destroy the client and surface a fatal error with this message.
    Propagate(String),
}

/// Map a client error to its recovery action.
pub fn classify(error: &ClientError) -> Recovery {
    if !error.fatal {
        return match error.details {
            ErrorDetails::BufferStalledError => Recovery::Buffering,
            _ => Recovery::Ignore,
        };
    }
    match error.category {
        ErrorCategory::Network => Recovery::RestartLoad,
        ErrorCategory::Media => Recovery::RecoverMedia,
        ErrorCategory::Other => Recovery::Propagate(error.summary()),
    }
}
