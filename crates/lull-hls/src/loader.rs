#![forbid(unsafe_code)]

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use lull_net::{Net, NetError, RetryPolicy, fetch_with_retry};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::{
    LoaderConfig, VariantChoice,
    error::HlsError,
    events::{ClientError, ClientEvent, ClientEventSender, ErrorCategory, ErrorDetails, Fragment, LevelDetails},
    live::{catch_up_sequence, live_start_sequence},
    parsing::{
        MasterPlaylist, MediaPlaylist, is_master_playlist, parse_master_playlist,
        parse_media_playlist, resolve_uri,
    },
};

/// Loading position shared between the client handle and its loader task.
///
/// Survives task restarts so a restart resumes where the previous task stopped.
#[derive(Debug, Default)]
pub(crate) struct Cursor {
    /// Selected media playlist, known once the manifest was parsed.
    pub(crate) level_url: Option<Url>,
    /// Next fragment to fetch.
    pub(crate) next_sequence: Option<u64>,
    /// Delivered fragments in order, with their start on the media timeline.
    pub(crate) timeline: Vec<(u64, f64)>,
    /// End of the last delivered fragment on the media timeline, in seconds.
    pub(crate) buffered_end: f64,
}

impl Cursor {
    fn delivered(&mut self, sequence: u64, duration: Duration) {
        self.next_sequence = Some(sequence + 1);
        self.timeline.push((sequence, self.buffered_end));
        self.buffered_end += duration.as_secs_f64();
    }

    /// Step back to the delivered fragment containing `position`, so
    /// everything from the playhead onwards is fetched again.
    ///
    /// A position before the first delivered fragment rewinds to that fragment.
    pub(crate) fn rewind(&mut self, position: f64) {
        let index = self
            .timeline
            .iter()
            .rposition(|&(_, start)| start <= position)
            .unwrap_or(0);
        let Some(&(sequence, start)) = self.timeline.get(index) else {
            return;
        };
        self.next_sequence = Some(sequence);
        self.timeline.truncate(index);
        self.buffered_end = start;
    }
}

/// Body of one loader task. Ends on fatal error, end of stream or cancellation.
pub(crate) struct Loader<N: Net> {
    pub(crate) net: Arc<N>,
    pub(crate) config: LoaderConfig,
    pub(crate) events: ClientEventSender,
    pub(crate) cursor: Arc<Mutex<Cursor>>,
}

/// Which request kind is being fetched; picks retry budget and error details.
#[derive(Clone, Copy, Debug)]
enum Request {
    Manifest,
    Level,
    Fragment,
}

impl Request {
    fn load_error(self) -> ErrorDetails {
        match self {
            Self::Manifest => ErrorDetails::ManifestLoadError,
            Self::Level => ErrorDetails::LevelLoadError,
            Self::Fragment => ErrorDetails::FragLoadError,
        }
    }
}

impl<N: Net> Loader<N> {
    pub(crate) async fn run(self, source: Url, cancel: CancellationToken) {
        let session = self.events.session();
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                trace!(%session, "loader cancelled");
            }
            () = self.drive(source) => {
                trace!(%session, "loader finished");
            }
        }
    }

    async fn drive(&self, source: Url) {
        let level_url = self.cursor.lock().level_url.clone();
        let (level_url, mut prefetched) = match level_url {
            Some(url) => (url, None),
            None => match self.load_manifest(&source).await {
                Some(found) => found,
                None => return,
            },
        };

        let mut refresh = None;
        loop {
            if let Some(delay) = refresh {
                tokio::time::sleep(delay).await;
            }

            let bytes = match prefetched.take() {
                Some(bytes) => bytes,
                None => match self.fetch(Request::Level, &level_url).await {
                    Some(bytes) => bytes,
                    None => return,
                },
            };
            let playlist = match parse_media_playlist(&bytes) {
                Ok(playlist) => playlist,
                Err(error) => {
                    self.fail(ErrorCategory::Other, ErrorDetails::LevelParsingError, &error);
                    return;
                }
            };

            self.emit(ClientEvent::LevelLoaded(self.level_details(&level_url, &playlist)));

            let delivered = match self.load_fragments(&level_url, &playlist).await {
                Some(delivered) => delivered,
                None => return,
            };

            if playlist.end_list {
                debug!(url = %level_url, "playlist closed, all fragments delivered");
                self.emit(ClientEvent::EndOfStream);
                return;
            }
            refresh = Some(self.refresh_interval(&playlist, delivered));
        }
    }

    /// Fetch the manifest and resolve the level to follow.
    ///
    /// Returns the level URL plus its body when the manifest already was one.
    async fn load_manifest(&self, source: &Url) -> Option<(Url, Option<Bytes>)> {
        let bytes = self.fetch(Request::Manifest, source).await?;

        if !is_master_playlist(&bytes) {
            if let Err(error) = parse_media_playlist(&bytes) {
                self.fail(ErrorCategory::Other, ErrorDetails::ManifestParsingError, &error);
                return None;
            }
            self.cursor.lock().level_url = Some(source.clone());
            self.emit(ClientEvent::ManifestParsed { variants: 1 });
            return Some((source.clone(), Some(bytes)));
        }

        let level_url = parse_master_playlist(&bytes)
            .and_then(|master| {
                let url = self.select_variant(source, &master)?;
                Ok((url, master.variants.len()))
            })
            .map_err(|error| {
                self.fail(ErrorCategory::Other, ErrorDetails::ManifestParsingError, &error);
            })
            .ok()?;

        let (url, variants) = level_url;
        debug!(%url, variants, "manifest parsed");
        self.cursor.lock().level_url = Some(url.clone());
        self.emit(ClientEvent::ManifestParsed { variants });
        Some((url, None))
    }

    fn select_variant(&self, source: &Url, master: &MasterPlaylist) -> Result<Url, HlsError> {
        let variant = match self.config.variant {
            VariantChoice::HighestBandwidth => {
                master.variants.iter().max_by_key(|v| v.bandwidth)
            }
            VariantChoice::Index(index) => master
                .variants
                .get(index)
                .or_else(|| master.variants.last()),
        }
        .ok_or(HlsError::NoVariants)?;
        resolve_uri(source, &variant.uri)
    }

    /// Fetch every fragment at or after the cursor. Returns how many were delivered.
    async fn load_fragments(&self, level_url: &Url, playlist: &MediaPlaylist) -> Option<usize> {
        let start = {
            let mut cursor = self.cursor.lock();
            let next = match cursor.next_sequence {
                Some(next) => {
                    let resumed = catch_up_sequence(playlist, next, &self.config);
                    if resumed != next {
                        debug!(from = next, to = resumed, "too far behind the live edge, catching up");
                    }
                    resumed
                }
                None => live_start_sequence(playlist, &self.config),
            };
            // Fell out of the live window: skip ahead to what is still listed.
            let next = next.max(playlist.media_sequence);
            cursor.next_sequence = Some(next);
            next
        };

        let mut delivered = 0;
        for segment in playlist.segments.iter().filter(|s| s.sequence >= start) {
            let url = match resolve_uri(level_url, &segment.uri) {
                Ok(url) => url,
                Err(error) => {
                    self.fail(ErrorCategory::Other, ErrorDetails::LevelParsingError, &error);
                    return None;
                }
            };
            let data = self.fetch(Request::Fragment, &url).await?;

            self.cursor.lock().delivered(segment.sequence, segment.duration);
            trace!(sequence = segment.sequence, bytes = data.len(), "fragment loaded");
            self.emit(ClientEvent::FragmentLoaded(Fragment {
                sequence: segment.sequence,
                duration: segment.duration,
                url,
                data,
            }));
            delivered += 1;
        }
        Some(delivered)
    }

    async fn fetch(&self, request: Request, url: &Url) -> Option<Bytes> {
        let policy = self.policy(request);
        let details = request.load_error();
        let result = fetch_with_retry(self.net.as_ref(), url, policy, |error: &NetError, attempt| {
            if attempt < policy.max_retries {
                self.emit(ClientEvent::Error(ClientError::non_fatal(
                    ErrorCategory::Network,
                    details,
                    error.to_string(),
                )));
            }
        })
        .await;

        match result {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                self.fail(ErrorCategory::Network, details, &error);
                None
            }
        }
    }

    fn policy(&self, request: Request) -> RetryPolicy {
        match request {
            Request::Manifest => self.config.manifest_retry,
            Request::Level => self.config.level_retry,
            Request::Fragment => self.config.fragment_retry,
        }
    }

    fn level_details(&self, url: &Url, playlist: &MediaPlaylist) -> LevelDetails {
        let live = !playlist.end_list;
        let total_duration = playlist.total_duration();
        let duration = if live && self.config.infinite_live_duration {
            None
        } else {
            Some(total_duration.as_secs_f64())
        };
        LevelDetails {
            url: url.clone(),
            live,
            total_duration,
            duration,
            target_duration: playlist.target_duration,
            fragments: playlist.segments.len(),
        }
    }

    fn refresh_interval(&self, playlist: &MediaPlaylist, delivered: usize) -> Duration {
        let interval = if delivered == 0 {
            playlist.target_duration / 2
        } else {
            playlist.target_duration
        };
        interval.max(self.config.min_refresh_interval)
    }

    fn fail(&self, category: ErrorCategory, details: ErrorDetails, error: &dyn std::error::Error) {
        warn!(session = %self.events.session(), %category, %details, %error, "loader failed");
        self.emit(ClientEvent::Error(ClientError::fatal(
            category,
            details,
            error.to_string(),
        )));
    }

    fn emit(&self, event: ClientEvent) {
        if !self.events.send(event) {
            trace!(session = %self.events.session(), "client event receiver gone");
        }
    }
}
