#![forbid(unsafe_code)]

//! Platform-independent playback model shared by every lull component.
//!
//! Both host controllers produce [`PlaybackState`] transitions from the same
//! [`PlaybackEvent`] vocabulary, so application code does not care which one
//! is active.

mod callbacks;
mod error;
pub mod job;
mod protocol;
mod state;

pub use callbacks::{PlayerCallbacks, PlayerOptions};
pub use error::PlaybackError;
pub use job::{DownloadInfo, JobState, JobStatus, StreamingInfo};
pub use protocol::{PlaybackCommand, PlaybackEvent};
pub use state::{PlaybackPhase, PlaybackState};
