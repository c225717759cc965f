use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::NetResult;

#[async_trait]
pub trait Net: Send + Sync + 'static {
    /// Get all bytes from a URL
    async fn get_bytes(&self, url: &Url) -> NetResult<Bytes>;
}

#[async_trait]
impl<N: Net + ?Sized> Net for std::sync::Arc<N> {
    async fn get_bytes(&self, url: &Url) -> NetResult<Bytes> {
        (**self).get_bytes(url).await
    }
}
