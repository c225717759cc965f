#![forbid(unsafe_code)]

//! # Lull
//!
//! Facade crate for HLS audio playback.
//!
//! ## Quick start
//!
//! ```ignore
//! use lull::prelude::*;
//!
//! let options = PlayerOptions::new(Some(url)).with_auto_play(true);
//! let player = create_player(options, PlayerConfig::default(), media)?;
//!
//! let mut state = player.watch();
//! state.wait_for(|s| s.is_playing).await?;
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod agent {
    pub use lull_agent::*;
}

pub mod bridge {
    pub use lull_bridge::*;
}

pub mod playback {
    pub use lull_core::*;
}

pub mod hls {
    pub use lull_hls::*;
}

pub mod host {
    pub use lull_host::*;
}

pub mod net {
    pub use lull_net::*;
}

// ── Player ──────────────────────────────────────────────────────────────

mod player;

pub use player::{Host, PlayerConfig, create_player};

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use lull_agent::{CanPlay, MediaElement, MediaEvent, MediaResult};
    pub use lull_core::{
        PlaybackError, PlaybackEvent, PlaybackPhase, PlaybackState, PlayerCallbacks,
        PlayerOptions,
    };
    pub use lull_host::{ControllerConfig, PlaybackController};

    pub use crate::{Host, PlayerConfig, create_player};
}
