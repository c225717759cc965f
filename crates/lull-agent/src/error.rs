#![forbid(unsafe_code)]

use thiserror::Error;

/// Failure reported synchronously by a [`MediaElement`](crate::MediaElement).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    /// `play()` was refused, typically by an autoplay policy.
    #[error("play() rejected: {0}")]
    PlayRejected(String),

    #[error("buffer append failed: {0}")]
    Append(String),
}

pub type MediaResult<T> = Result<T, MediaError>;
