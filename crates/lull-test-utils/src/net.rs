//! In-memory [`Net`] implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use lull_net::{Net, NetError, NetResult};
use parking_lot::Mutex;
use url::Url;

/// Answers from a map; unknown URLs get a 404.
#[derive(Default)]
pub struct MemoryNet {
    bodies: Mutex<HashMap<String, Bytes>>,
    requests: Mutex<HashMap<String, usize>>,
}

impl MemoryNet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(self, url: &Url, body: impl Into<Bytes>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn insert(&self, url: &Url, body: impl Into<Bytes>) {
        self.bodies.lock().insert(url.to_string(), body.into());
    }

    pub fn remove(&self, url: &Url) {
        self.bodies.lock().remove(url.as_str());
    }

    #[must_use]
    pub fn requests(&self, url: &Url) -> usize {
        self.requests.lock().get(url.as_str()).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Net for MemoryNet {
    async fn get_bytes(&self, url: &Url) -> NetResult<Bytes> {
        *self.requests.lock().entry(url.to_string()).or_default() += 1;
        self.bodies
            .lock()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| NetError::http_status(404, url.as_str()))
    }
}
