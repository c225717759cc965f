#![forbid(unsafe_code)]

use std::time::Duration;

use derivative::Derivative;
use derive_setters::Setters;
use lull_agent::AgentConfig;

/// Host controller tuning.
#[derive(Clone, Debug, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
pub struct ControllerConfig {
    /// Delay between a `load` and the auto-play that follows it. Default: 100 ms.
    #[derivative(Default(value = "Duration::from_millis(100)"))]
    pub settle_delay: Duration,
    /// Delay between retry teardown and reinitialization. Default: 100 ms.
    #[derivative(Default(value = "Duration::from_millis(100)"))]
    pub retry_delay: Duration,
    /// Capacity of the application → controller channel. Default: 64.
    #[derivative(Default(value = "64"))]
    pub command_channel_capacity: usize,
    /// Agent settings for controllers that build their own agent.
    pub agent: AgentConfig,
}
