#![forbid(unsafe_code)]

//! Shared test utilities for the lull workspace.

pub mod client;
pub mod fixtures;
pub mod http_server;
pub mod media;
pub mod net;

pub use client::{ClientCall, ScriptedClient, ScriptedClientFactory};
pub use fixtures::{HlsOrigin, media_playlist};
pub use http_server::TestHttpServer;
pub use media::{FakeMediaElement, MediaCall};
pub use net::MemoryNet;
