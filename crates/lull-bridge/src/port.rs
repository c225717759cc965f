#![forbid(unsafe_code)]

use lull_agent::EventSink;
use lull_core::PlaybackEvent;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::{
    codec::encode_event,
    error::{BridgeError, BridgeResult},
};

/// One direction of the bridge: accepts encoded messages in send order.
pub trait MessagePort: Send + 'static {
    fn post(&self, message: String) -> BridgeResult<()>;
}

impl MessagePort for mpsc::UnboundedSender<String> {
    fn post(&self, message: String) -> BridgeResult<()> {
        self.send(message).map_err(|_| BridgeError::Closed)
    }
}

/// [`EventSink`] that encodes agent events onto a [`MessagePort`].
pub struct BridgeEventSink<P: MessagePort> {
    port: P,
}

impl<P: MessagePort> BridgeEventSink<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }
}

impl<P: MessagePort> EventSink for BridgeEventSink<P> {
    fn emit(&self, event: PlaybackEvent) {
        let message = match encode_event(&event) {
            Ok(message) => message,
            Err(error) => {
                warn!(event = event.tag(), %error, "failed to encode event");
                return;
            }
        };
        if let Err(error) = self.port.post(message) {
            trace!(event = event.tag(), %error, "event dropped");
        }
    }
}
