#![forbid(unsafe_code)]

use std::time::Duration;

use derivative::Derivative;
use derive_setters::Setters;
use lull_net::RetryPolicy;

/// Which variant of a master playlist to follow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VariantChoice {
    #[default]
    HighestBandwidth,
    /// Position in the master playlist, clamped to the last variant.
    Index(usize),
}

/// Loader tuning for the software segment client.
#[derive(Clone, Debug, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_", strip_option)]
pub struct LoaderConfig {
    /// Retry budget for the manifest request. Default: 4 retries, 1 s apart.
    #[derivative(Default(value = "RetryPolicy::new(4, Duration::from_secs(1))"))]
    pub manifest_retry: RetryPolicy,
    /// Retry budget for level (media playlist) requests. Default: 4 retries, 1 s apart.
    #[derivative(Default(value = "RetryPolicy::new(4, Duration::from_secs(1))"))]
    pub level_retry: RetryPolicy,
    /// Retry budget for fragment requests. Default: 6 retries, 1 s apart.
    #[derivative(Default(value = "RetryPolicy::new(6, Duration::from_secs(1))"))]
    pub fragment_retry: RetryPolicy,
    /// Distance behind the live edge where playback of a live playlist starts.
    #[derivative(Default(value = "Duration::from_secs(3)"))]
    pub live_sync_duration: Duration,
    /// Latency bound for live playback. A live playlist holding no more than
    /// this starts at its first fragment; a running session with more than
    /// this still ahead jumps forward to `live_sync_duration` before the edge.
    #[derivative(Default(value = "Duration::from_secs(10)"))]
    pub live_max_latency: Duration,
    /// Report no duration while the playlist is still live.
    #[derivative(Default(value = "true"))]
    pub infinite_live_duration: bool,
    /// Lower bound on the live playlist refresh interval.
    #[derivative(Default(value = "Duration::from_millis(500)"))]
    pub min_refresh_interval: Duration,
    pub variant: VariantChoice,
}
