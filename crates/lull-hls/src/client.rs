#![forbid(unsafe_code)]

use std::sync::Arc;

use lull_net::Net;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::{
    HlsError, HlsResult, LoaderConfig,
    events::ClientEventSender,
    loader::{Cursor, Loader},
    traits::{SegmentClient, SegmentClientFactory},
};

#[derive(Debug, Default)]
struct Control {
    source: Option<Url>,
    cancel: Option<CancellationToken>,
    destroyed: bool,
}

/// Software segment client backed by a [`Net`] implementation.
///
/// Each `load_source`/`restart_load`/`recover_media_error` cancels the running
/// loader task and spawns a new one on the runtime the client was created on.
pub struct HlsClient<N: Net> {
    net: Arc<N>,
    config: LoaderConfig,
    events: ClientEventSender,
    cursor: Arc<Mutex<Cursor>>,
    control: Mutex<Control>,
    runtime: Handle,
}

impl<N: Net> HlsClient<N> {
    /// Create a client on the current tokio runtime.
    pub fn new(net: Arc<N>, config: LoaderConfig, events: ClientEventSender) -> HlsResult<Self> {
        let runtime = Handle::try_current().map_err(|_| HlsError::NoRuntime)?;
        Ok(Self {
            net,
            config,
            events,
            cursor: Arc::new(Mutex::new(Cursor::default())),
            control: Mutex::new(Control::default()),
            runtime,
        })
    }

    fn spawn(&self, control: &mut Control) {
        let Some(source) = control.source.clone() else {
            return;
        };
        if let Some(previous) = control.cancel.take() {
            previous.cancel();
        }

        let cancel = CancellationToken::new();
        control.cancel = Some(cancel.clone());

        let loader = Loader {
            net: Arc::clone(&self.net),
            config: self.config.clone(),
            events: self.events.clone(),
            cursor: Arc::clone(&self.cursor),
        };
        self.runtime.spawn(loader.run(source, cancel));
    }
}

impl<N: Net> SegmentClient for HlsClient<N> {
    fn load_source(&self, url: Url) {
        let mut control = self.control.lock();
        if control.destroyed {
            return;
        }
        debug!(session = %self.events.session(), %url, "load source");
        *self.cursor.lock() = Cursor::default();
        control.source = Some(url);
        self.spawn(&mut control);
    }

    fn restart_load(&self) {
        let mut control = self.control.lock();
        if control.destroyed {
            return;
        }
        debug!(session = %self.events.session(), "restart load");
        self.spawn(&mut control);
    }

    fn recover_media_error(&self, position: f64) {
        let mut control = self.control.lock();
        if control.destroyed {
            return;
        }
        debug!(session = %self.events.session(), position, "recover media error");
        self.cursor.lock().rewind(position);
        self.spawn(&mut control);
    }

    fn destroy(&self) {
        let mut control = self.control.lock();
        control.destroyed = true;
        if let Some(cancel) = control.cancel.take() {
            cancel.cancel();
        }
    }
}

impl<N: Net> Drop for HlsClient<N> {
    fn drop(&mut self) {
        if let Some(cancel) = self.control.get_mut().cancel.take() {
            cancel.cancel();
        }
    }
}

/// Builds an [`HlsClient`] per session, sharing one network stack.
pub struct HlsClientFactory<N: Net> {
    net: Arc<N>,
    config: LoaderConfig,
}

impl<N: Net> HlsClientFactory<N> {
    pub fn new(net: Arc<N>, config: LoaderConfig) -> Self {
        Self { net, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }
}

impl<N: Net> SegmentClientFactory for HlsClientFactory<N> {
    type Client = HlsClient<N>;

    fn is_supported(&self) -> bool {
        Handle::try_current().is_ok()
    }

    fn create(&self, events: ClientEventSender) -> HlsResult<HlsClient<N>> {
        HlsClient::new(Arc::clone(&self.net), self.config.clone(), events)
    }
}
