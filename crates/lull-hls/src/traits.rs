#![forbid(unsafe_code)]

use url::Url;

use crate::{HlsResult, events::ClientEventSender};

/// Segment-loading client driven by the playback agent.
///
/// Everything a client learns is reported on the [`ClientEventSender`] it was
/// created with; none of these calls block on the network.
#[cfg_attr(
    any(test, feature = "test-utils"),
    unimock::unimock(api = SegmentClientMock)
)]
pub trait SegmentClient: Send + 'static {
    /// Start fetching the manifest at `url`.
    fn load_source(&self, url: Url);

    /// Resume loading from the current position after a network failure.
    fn restart_load(&self);

    /// Re-deliver everything from the fragment containing `position` (the
    /// playhead, in seconds) after a media failure flushed the buffer.
    fn recover_media_error(&self, position: f64);

    /// Stop all loading. The client is unusable afterwards.
    fn destroy(&self);
}

/// Creates one [`SegmentClient`] per agent session.
pub trait SegmentClientFactory: Send + 'static {
    type Client: SegmentClient;

    /// Whether a software client can run in this environment.
    fn is_supported(&self) -> bool {
        true
    }

    fn create(&self, events: ClientEventSender) -> HlsResult<Self::Client>;
}

impl<F, C> SegmentClientFactory for F
where
    F: Fn(ClientEventSender) -> C + Send + 'static,
    C: SegmentClient,
{
    type Client = C;

    fn create(&self, events: ClientEventSender) -> HlsResult<C> {
        Ok(self(events))
    }
}
