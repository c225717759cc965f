#![forbid(unsafe_code)]

use std::time::Duration;

use crate::{LoaderConfig, parsing::MediaPlaylist};

/// Sequence number to start a fresh session at.
///
/// Closed playlists and live playlists holding no more than
/// `live_max_latency` start at the first fragment, so a job that only just
/// started is heard from its beginning. Longer live playlists start at the
/// sync point, `live_sync_duration` before the edge.
pub fn live_start_sequence(playlist: &MediaPlaylist, config: &LoaderConfig) -> u64 {
    if playlist.end_list || playlist.total_duration() <= config.live_max_latency {
        return playlist.media_sequence;
    }
    sync_sequence(playlist, config)
}

/// Where a running live session continues after a playlist refresh.
///
/// A session with more than `live_max_latency` of listed media still ahead
/// of `next` has fallen behind the edge and jumps forward to the sync point.
pub fn catch_up_sequence(playlist: &MediaPlaylist, next: u64, config: &LoaderConfig) -> u64 {
    if playlist.end_list {
        return next;
    }
    let ahead: Duration = playlist
        .segments
        .iter()
        .filter(|s| s.sequence >= next)
        .map(|s| s.duration)
        .sum();
    if ahead <= config.live_max_latency {
        return next;
    }
    sync_sequence(playlist, config).max(next)
}

/// Latest fragment that still leaves `live_sync_duration` of media before the edge.
fn sync_sequence(playlist: &MediaPlaylist, config: &LoaderConfig) -> u64 {
    let mut behind_edge = Duration::ZERO;
    for segment in playlist.segments.iter().rev() {
        behind_edge += segment.duration;
        if behind_edge >= config.live_sync_duration {
            return segment.sequence;
        }
    }
    playlist.media_sequence
}
