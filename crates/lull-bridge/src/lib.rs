#![forbid(unsafe_code)]

//! Bridge between a host controller and a playback agent living behind a
//! message-only boundary.
//!
//! Both directions carry JSON text. Commands are objects tagged by
//! `command`, events by `type`; see [`codec`] for the decoding rules.

pub mod codec;
mod endpoint;
mod error;
mod port;
mod surface;

pub use codec::{decode_command, decode_event, encode_command, encode_event};
pub use endpoint::AgentEndpoint;
pub use error::{BridgeError, BridgeResult};
pub use port::{BridgeEventSink, MessagePort};
pub use surface::{LocalSurface, RenderingSurface};
