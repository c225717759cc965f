#![forbid(unsafe_code)]

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message has no `{0}` tag")]
    MissingTag(&'static str),

    #[error("Bridge channel closed")]
    Closed,
}

pub type BridgeResult<T> = Result<T, BridgeError>;
