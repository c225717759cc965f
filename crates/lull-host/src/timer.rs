#![forbid(unsafe_code)]

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// At most one pending action, fired once its deadline passes.
#[derive(Debug)]
pub(crate) struct Deferred<T> {
    slot: Option<(Instant, T)>,
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> Deferred<T> {
    /// Schedule `action` after `delay`, replacing anything pending.
    pub(crate) fn arm(&mut self, delay: Duration, action: T) {
        self.slot = Some((Instant::now() + delay, action));
    }

    pub(crate) fn clear(&mut self) {
        self.slot = None;
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    /// Resolve with the pending action when due. Never resolves when idle.
    /// Cancel safe.
    pub(crate) async fn fired(&mut self) -> T {
        loop {
            let Some((at, _)) = &self.slot else {
                return std::future::pending().await;
            };
            sleep_until(*at).await;
            if let Some((_, action)) = self.slot.take() {
                return action;
            }
        }
    }
}
