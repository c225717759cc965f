//! Command and event vocabulary spoken between host controllers and the agent.
//!
//! The serde representation is the bridge wire format: commands are tagged by
//! a `command` field, events by a `type` field.

use serde::{Deserialize, Serialize};
use url::Url;

/// Host → agent instruction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PlaybackCommand {
    /// Start a new session for `url` (no-op if already loaded).
    Load { url: Url },
    Play,
    Pause,
    /// Move the playhead to `time` seconds.
    Seek { time: f64 },
    /// Output volume in `[0, 1]`.
    SetVolume { volume: f64 },
}

impl PlaybackCommand {
    /// Every `command` tag this enum can decode.
    pub const TAGS: &'static [&'static str] = &["load", "play", "pause", "seek", "setVolume"];

    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Seek { .. } => "seek",
            Self::SetVolume { .. } => "setVolume",
        }
    }
}

/// Agent → host notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlaybackEvent {
    /// Agent finished initializing and accepts commands.
    #[serde(rename = "ready")]
    Ready,
    /// A new session started fetching its manifest.
    #[serde(rename = "loading")]
    Loading,
    /// Manifest parsed (software client) or media can play (native).
    #[serde(rename = "loaded")]
    Loaded,
    #[serde(rename = "playing")]
    Playing,
    #[serde(rename = "paused")]
    Paused,
    /// Local playback reached end of media.
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "buffering")]
    Buffering { buffering: bool },
    #[serde(rename = "timeupdate")]
    TimeUpdate {
        #[serde(rename = "currentTime")]
        current_time: f64,
        duration: Option<f64>,
    },
    #[serde(rename = "durationchange")]
    DurationChange { duration: Option<f64> },
    /// The remote stream is fully produced; no more segments will appear.
    #[serde(rename = "streamComplete")]
    StreamComplete,
    /// Failure report. A missing `fatal` flag means fatal.
    #[serde(rename = "error")]
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fatal: Option<bool>,
    },
}

impl PlaybackEvent {
    /// Every `type` tag this enum can decode.
    pub const TAGS: &'static [&'static str] = &[
        "ready",
        "loading",
        "loaded",
        "playing",
        "paused",
        "complete",
        "buffering",
        "timeupdate",
        "durationchange",
        "streamComplete",
        "error",
    ];

    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Complete => "complete",
            Self::Buffering { .. } => "buffering",
            Self::TimeUpdate { .. } => "timeupdate",
            Self::DurationChange { .. } => "durationchange",
            Self::StreamComplete => "streamComplete",
            Self::Error { .. } => "error",
        }
    }

    /// Fatal error event.
    pub fn fatal_error<S: Into<String>>(message: S) -> Self {
        Self::Error {
            message: message.into(),
            fatal: Some(true),
        }
    }

    /// Non-fatal error event.
    pub fn warning<S: Into<String>>(message: S) -> Self {
        Self::Error {
            message: message.into(),
            fatal: Some(false),
        }
    }

    #[must_use]
    pub fn is_fatal_error(&self) -> bool {
        matches!(self, Self::Error { fatal, .. } if fatal.unwrap_or(true))
    }
}
