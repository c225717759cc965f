#![forbid(unsafe_code)]

use thiserror::Error;

/// HLS client errors.
#[derive(Debug, Error)]
pub enum HlsError {
    #[error("Network error: {0}")]
    Net(#[from] lull_net::NetError),

    #[error("Playlist parsing error: {0}")]
    PlaylistParse(String),

    #[error("No playable variant in master playlist")]
    NoVariants,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No async runtime available to drive the loader")]
    NoRuntime,
}

pub type HlsResult<T> = Result<T, HlsError>;
