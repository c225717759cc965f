#![forbid(unsafe_code)]

use std::sync::Arc;

use derive_setters::Setters;
use lull_agent::MediaElement;
use lull_bridge::LocalSurface;
use lull_core::PlayerOptions;
use lull_hls::{HlsClientFactory, LoaderConfig};
use lull_host::{ControllerConfig, DirectPlayer, PlaybackController, SandboxedPlayer};
use lull_net::{HttpClient, NetOptions, NetResult};
use tracing::debug;

/// Which host controller drives playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Host {
    /// The controller owns the agent and media element.
    #[default]
    Direct,
    /// The agent runs behind a message-passing surface.
    Sandboxed,
}

/// Everything needed to build a player besides the media element.
#[derive(Clone, Debug, Default, Setters)]
#[setters(prefix = "with_")]
pub struct PlayerConfig {
    pub host: Host,
    pub controller: ControllerConfig,
    /// Software client tuning, used when the media element cannot play HLS.
    pub loader: LoaderConfig,
    pub net: NetOptions,
}

/// Build and start a player on the current tokio runtime.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created.
pub fn create_player<M: MediaElement>(
    options: PlayerOptions,
    config: PlayerConfig,
    media: M,
) -> NetResult<Box<dyn PlaybackController>> {
    let PlayerConfig {
        host,
        controller,
        loader,
        net,
    } = config;
    let factory = HlsClientFactory::new(Arc::new(HttpClient::new(net)?), loader);
    debug!(?host, url = ?options.playlist_url, "creating player");

    Ok(match host {
        Host::Direct => Box::new(DirectPlayer::spawn(options, controller, media, factory)),
        Host::Sandboxed => {
            let surface = LocalSurface::spawn(controller.agent.clone(), media, factory);
            Box::new(SandboxedPlayer::spawn(options, controller, surface))
        }
    })
}
