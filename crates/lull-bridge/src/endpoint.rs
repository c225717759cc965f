#![forbid(unsafe_code)]

use lull_agent::{AgentConfig, EventSink, MediaElement, PlaybackAgent};
use lull_core::PlaybackEvent;
use lull_hls::SegmentClientFactory;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    codec::decode_command,
    port::{BridgeEventSink, MessagePort},
};

/// Surface-side end of the bridge.
///
/// Owns a [`PlaybackAgent`] whose events are posted as JSON on `P`, and
/// dispatches decoded commands to it. `ready` is posted once, on construction.
pub struct AgentEndpoint<M, F, P>
where
    M: MediaElement,
    F: SegmentClientFactory,
    P: MessagePort,
{
    agent: PlaybackAgent<M, F, BridgeEventSink<P>>,
}

impl<M, F, P> AgentEndpoint<M, F, P>
where
    M: MediaElement,
    F: SegmentClientFactory,
    P: MessagePort,
{
    pub fn new(config: AgentConfig, media: M, factory: F, port: P) -> Self {
        let agent = PlaybackAgent::new(config, media, factory, BridgeEventSink::new(port));
        agent.sink().emit(PlaybackEvent::Ready);
        Self { agent }
    }

    /// Decode one inbound message and apply it.
    pub fn handle_message(&mut self, text: &str) {
        match decode_command(text) {
            Ok(Some(command)) => self.agent.handle_command(command),
            Ok(None) => {}
            Err(error) => warn!(%error, "dropping malformed command"),
        }
    }

    /// Serve `inbound` until it closes or `cancel` fires. The agent is torn
    /// down on return.
    pub async fn run(mut self, mut inbound: mpsc::UnboundedReceiver<String>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                message = inbound.recv() => match message {
                    Some(text) => self.handle_message(&text),
                    None => break,
                },
                input = self.agent.next_input() => self.agent.handle_input(input),
            }
        }
        debug!("agent endpoint stopped");
    }
}
