#![forbid(unsafe_code)]

//! Software segment-loading client for HLS audio.
//!
//! Used by the playback agent whenever the media element cannot play HLS
//! natively. The client fetches the manifest and level playlists, follows a
//! live playlist until `#EXT-X-ENDLIST`, downloads fragments with per-kind
//! retry budgets and reports everything as [`ClientEvent`]s tagged with the
//! session that created it.

mod client;
mod config;
mod error;
mod events;
mod live;
mod loader;
pub mod parsing;
mod traits;

pub use client::{HlsClient, HlsClientFactory};
pub use config::{LoaderConfig, VariantChoice};
pub use error::{HlsError, HlsResult};
pub use events::{
    ClientError, ClientEvent, ClientEventReceiver, ClientEventSender, ErrorCategory, ErrorDetails,
    Fragment, LevelDetails, SessionId, client_channel,
};
pub use live::{catch_up_sequence, live_start_sequence};
#[cfg(any(test, feature = "test-utils"))]
pub use traits::SegmentClientMock;
pub use traits::{SegmentClient, SegmentClientFactory};
