//! HLS playlist parsing and data types.

use std::time::Duration;

use hls_m3u8::{
    MasterPlaylist as HlsMasterPlaylist, MediaPlaylist as HlsMediaPlaylist,
    tags::VariantStream as HlsVariantStreamTag,
};
use url::Url;

use crate::{HlsError, HlsResult};

/// Parsed master playlist.
#[derive(Debug, Clone)]
pub struct MasterPlaylist {
    /// Audio-capable variants in playlist order (I-frame streams are skipped).
    pub variants: Vec<VariantStream>,
}

/// One variant stream entry from a master playlist.
#[derive(Debug, Clone)]
pub struct VariantStream {
    /// Position in [`MasterPlaylist::variants`].
    pub index: usize,
    /// Absolute or relative URL of the media playlist for this variant.
    pub uri: String,
    /// Advertised bandwidth in bits per second.
    pub bandwidth: u64,
    /// The raw `CODECS="..."` string from the playlist.
    pub codecs: Option<String>,
}

/// Parsed media playlist.
#[derive(Debug, Clone)]
pub struct MediaPlaylist {
    /// List of segments in the order they appear.
    pub segments: Vec<MediaSegment>,
    pub target_duration: Duration,
    /// Media sequence number of the first segment.
    pub media_sequence: u64,
    /// Whether the playlist is finished (VOD or live that ended).
    pub end_list: bool,
}

/// One media segment entry.
#[derive(Debug, Clone)]
pub struct MediaSegment {
    /// Sequence number of the segment (media-sequence + index in playlist).
    pub sequence: u64,
    /// URL of the segment (absolute or relative to playlist URI).
    pub uri: String,
    pub duration: Duration,
}

impl MediaPlaylist {
    /// Sum of all segment durations currently listed.
    pub fn total_duration(&self) -> Duration {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Sequence number one past the last listed segment.
    pub fn end_sequence(&self) -> u64 {
        self.media_sequence + self.segments.len() as u64
    }
}

/// Whether `data` looks like a master (multivariant) playlist.
pub fn is_master_playlist(data: &[u8]) -> bool {
    std::str::from_utf8(data).is_ok_and(|s| s.contains("#EXT-X-STREAM-INF"))
}

/// Parses a master playlist (M3U8) into [`MasterPlaylist`].
pub fn parse_master_playlist(data: &[u8]) -> HlsResult<MasterPlaylist> {
    let input = std::str::from_utf8(data).map_err(|e| HlsError::PlaylistParse(e.to_string()))?;
    let hls_master = HlsMasterPlaylist::try_from(input)
        .map_err(|e| HlsError::PlaylistParse(e.to_string()))?
        .into_owned();

    let variants = hls_master
        .variant_streams
        .iter()
        .filter_map(|vs| match vs {
            HlsVariantStreamTag::ExtXStreamInf {
                uri, stream_data, ..
            } => Some((
                uri.to_string(),
                stream_data.bandwidth(),
                stream_data.codecs().map(|c| c.to_string()),
            )),
            HlsVariantStreamTag::ExtXIFrame { .. } => None,
        })
        .enumerate()
        .map(|(index, (uri, bandwidth, codecs))| VariantStream {
            index,
            uri,
            bandwidth,
            codecs,
        })
        .collect();

    Ok(MasterPlaylist { variants })
}

/// Parses a media playlist (M3U8) into [`MediaPlaylist`].
pub fn parse_media_playlist(data: &[u8]) -> HlsResult<MediaPlaylist> {
    let input = std::str::from_utf8(data).map_err(|e| HlsError::PlaylistParse(e.to_string()))?;
    let hls_media = HlsMediaPlaylist::try_from(input)
        .map_err(|e| HlsError::PlaylistParse(e.to_string()))?
        .into_owned();

    // Treat `#EXT-X-ENDLIST` as the only reliable end-of-stream marker.
    let end_list = input.contains("#EXT-X-ENDLIST");
    let media_sequence = hls_media.media_sequence as u64;

    let segments = hls_media
        .segments
        .iter()
        .enumerate()
        .map(|(index, (_idx, seg))| MediaSegment {
            sequence: media_sequence + index as u64,
            uri: seg.uri().to_string(),
            duration: seg.duration.duration(),
        })
        .collect();

    Ok(MediaPlaylist {
        segments,
        target_duration: hls_media.target_duration,
        media_sequence,
        end_list,
    })
}

/// Resolve a playlist-relative URI against the playlist URL.
pub fn resolve_uri(base: &Url, target: &str) -> HlsResult<Url> {
    base.join(target)
        .map_err(|e| HlsError::InvalidUrl(format!("{target} relative to {base}: {e}")))
}
