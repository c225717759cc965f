#![forbid(unsafe_code)]

use derivative::Derivative;
use derive_setters::Setters;

/// MIME type probed to decide between native playback and the software client.
pub const HLS_MIME: &str = "application/vnd.apple.mpegurl";

#[derive(Clone, Debug, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_", into)]
pub struct AgentConfig {
    /// Try native playback before the software client. Default: true.
    #[derivative(Default(value = "true"))]
    pub prefer_native: bool,
    /// MIME type passed to [`MediaElement::can_play_type`](crate::MediaElement::can_play_type).
    #[derivative(Default(value = "HLS_MIME.to_string()"))]
    pub native_mime: String,
}
