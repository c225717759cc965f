#![forbid(unsafe_code)]

//! Embedded playback agent.
//!
//! [`PlaybackAgent`] owns one [`MediaElement`] and, when the element cannot
//! play HLS natively, one software segment client per session. It turns
//! media and client activity into normalized [`PlaybackEvent`]s on an
//! [`EventSink`] and applies the recovery policy from [`classify`].
//!
//! [`PlaybackEvent`]: lull_core::PlaybackEvent

mod agent;
mod classify;
mod config;
mod error;
mod media;
mod sink;

pub use agent::{AgentInput, PlaybackAgent};
pub use classify::{Recovery, classify};
pub use config::AgentConfig;
pub use error::{MediaError, MediaResult};
pub use media::{CanPlay, MediaElement, MediaEvent};
pub use sink::EventSink;
