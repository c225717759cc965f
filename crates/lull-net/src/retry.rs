use bytes::Bytes;
use tokio::time::sleep;
use tracing::debug;
use url::Url;

use crate::{
    error::{NetError, NetResult},
    traits::Net,
    types::RetryPolicy,
};

/// Fetch `url`, retrying every failure according to `policy`.
///
/// `on_failure` observes each failed attempt (0-based) before the next one is
/// scheduled, including the last. After the budget is spent the last error is
/// wrapped in [`NetError::RetryExhausted`].
pub async fn fetch_with_retry<N, F>(
    net: &N,
    url: &Url,
    policy: RetryPolicy,
    mut on_failure: F,
) -> NetResult<Bytes>
where
    N: Net + ?Sized,
    F: FnMut(&NetError, u32) + Send,
{
    let mut last_error = None;

    for attempt in 0..policy.max_attempts() {
        let delay = policy.delay_for_attempt(attempt);
        if !delay.is_zero() {
            sleep(delay).await;
        }

        match net.get_bytes(url).await {
            Ok(bytes) => return Ok(bytes),
            Err(error) => {
                debug!(%url, attempt, %error, "fetch attempt failed");
                on_failure(&error, attempt);
                last_error = Some(error);
            }
        }
    }

    Err(NetError::RetryExhausted {
        max_retries: policy.max_retries,
        source: Box::new(last_error.unwrap_or_else(|| NetError::http("no attempt made"))),
    })
}
