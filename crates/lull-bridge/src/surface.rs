#![forbid(unsafe_code)]

use lull_agent::{AgentConfig, MediaElement};
use lull_hls::SegmentClientFactory;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    endpoint::AgentEndpoint,
    error::{BridgeError, BridgeResult},
};

/// Isolated context hosting a playback agent, reachable only by messages.
pub trait RenderingSurface: Send + 'static {
    /// Send one encoded command to the agent.
    fn post(&self, message: String) -> BridgeResult<()>;

    /// Messages from the agent. Available once.
    fn take_inbound(&mut self) -> Option<mpsc::UnboundedReceiver<String>>;

    /// Tear the surface down, agent included.
    fn destroy(&mut self);
}

/// Surface running an [`AgentEndpoint`] on a tokio task in this process.
///
/// The endpoint is built inside the task, so `ready` arrives asynchronously
/// as it would from a real sandbox.
pub struct LocalSurface {
    outbound: mpsc::UnboundedSender<String>,
    inbound: Option<mpsc::UnboundedReceiver<String>>,
    cancel: CancellationToken,
}

impl LocalSurface {
    /// Spawn the agent task. Must be called within a tokio runtime.
    pub fn spawn<M, F>(config: AgentConfig, media: M, factory: F) -> Self
    where
        M: MediaElement,
        F: SegmentClientFactory,
    {
        let (outbound, agent_rx) = mpsc::unbounded_channel();
        let (host_tx, inbound) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let token = cancel.clone();
        tokio::spawn(async move {
            let endpoint = AgentEndpoint::new(config, media, factory, host_tx);
            endpoint.run(agent_rx, token).await;
        });

        Self {
            outbound,
            inbound: Some(inbound),
            cancel,
        }
    }
}

impl RenderingSurface for LocalSurface {
    fn post(&self, message: String) -> BridgeResult<()> {
        if self.cancel.is_cancelled() {
            return Err(BridgeError::Closed);
        }
        self.outbound.send(message).map_err(|_| BridgeError::Closed)
    }

    fn take_inbound(&mut self) -> Option<mpsc::UnboundedReceiver<String>> {
        self.inbound.take()
    }

    fn destroy(&mut self) {
        if !self.cancel.is_cancelled() {
            debug!("destroying local surface");
            self.cancel.cancel();
        }
    }
}

impl Drop for LocalSurface {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
