#![forbid(unsafe_code)]

use lull_core::PlaybackEvent;
use tokio::sync::mpsc;
use tracing::trace;

/// Destination of the agent's normalized events.
pub trait EventSink: Send + 'static {
    fn emit(&self, event: PlaybackEvent);
}

impl EventSink for mpsc::UnboundedSender<PlaybackEvent> {
    fn emit(&self, event: PlaybackEvent) {
        if let Err(error) = self.send(event) {
            trace!(event = error.0.tag(), "event sink closed");
        }
    }
}
