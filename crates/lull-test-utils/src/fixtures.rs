//! HLS content served to integration tests.

use std::{collections::HashMap, fmt::Write as _, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use parking_lot::Mutex;

use crate::http_server::TestHttpServer;

/// Media playlist with `count` segments of `segment_secs` named `segment_NNN.ts`.
pub fn media_playlist(first: u64, count: u64, segment_secs: f64, end_list: bool) -> String {
    let target = segment_secs.ceil() as u64;
    let mut body = format!(
        "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:{target}\n#EXT-X-MEDIA-SEQUENCE:{first}\n"
    );
    for seq in first..first + count {
        let _ = write!(body, "#EXTINF:{segment_secs:.3},\nsegment_{seq:03}.ts\n");
    }
    if end_list {
        body.push_str("#EXT-X-ENDLIST\n");
    }
    body
}

#[derive(Default)]
struct Files {
    bodies: HashMap<String, Bytes>,
    hits: HashMap<String, usize>,
}

/// Mutable HLS origin: tests publish playlists and segments while the
/// client is already following them.
#[derive(Clone, Default)]
pub struct HlsOrigin {
    files: Arc<Mutex<Files>>,
}

impl HlsOrigin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish (or replace) `path`.
    pub fn put(&self, path: &str, body: impl Into<Bytes>) {
        self.files
            .lock()
            .bodies
            .insert(path.trim_start_matches('/').to_string(), body.into());
    }

    pub fn remove(&self, path: &str) {
        self.files.lock().bodies.remove(path.trim_start_matches('/'));
    }

    /// Publish segments `first..first + count`.
    #[must_use]
    pub fn with_segments(self, first: u64, count: u64) -> Self {
        for seq in first..first + count {
            self.put(&format!("segment_{seq:03}.ts"), format!("audio-{seq}"));
        }
        self
    }

    #[must_use]
    pub fn with_playlist(self, path: &str, body: String) -> Self {
        self.put(path, body);
        self
    }

    /// Requests seen for `path`, served or not.
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        self.files
            .lock()
            .hits
            .get(path.trim_start_matches('/'))
            .copied()
            .unwrap_or(0)
    }

    pub fn router(&self) -> Router {
        Router::new().fallback(serve_file).with_state(self.clone())
    }

    pub async fn serve(&self) -> TestHttpServer {
        TestHttpServer::new(self.router()).await
    }
}

async fn serve_file(State(origin): State<HlsOrigin>, uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/').to_string();
    let body = {
        let mut files = origin.files.lock();
        *files.hits.entry(path.clone()).or_default() += 1;
        files.bodies.get(&path).cloned()
    };

    let Some(body) = body else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let content_type = if path.ends_with(".m3u8") {
        "application/vnd.apple.mpegurl"
    } else {
        "video/mp2t"
    };
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}
