#![forbid(unsafe_code)]

//! Host controllers: the application-facing side of lull playback.
//!
//! [`SandboxedPlayer`] talks to an agent behind a [`RenderingSurface`] using
//! JSON messages; [`DirectPlayer`] owns its agent. Both present the same
//! [`PlaybackController`] and derive [`PlaybackState`] from the same events.
//!
//! [`RenderingSurface`]: lull_bridge::RenderingSurface
//! [`PlaybackState`]: lull_core::PlaybackState

mod config;
mod controller;
mod direct;
mod sandboxed;
mod timer;
mod tracker;

pub use config::ControllerConfig;
pub use controller::{PlaybackController, PlayerHandle};
pub use direct::DirectPlayer;
pub use sandboxed::{SandboxedCore, SandboxedPlayer};
pub use tracker::StateTracker;
