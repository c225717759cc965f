use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use url::Url;

use crate::{
    error::{NetError, NetResult},
    traits::Net,
    types::NetOptions,
};

#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    options: NetOptions,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns [`NetError`] if the TLS backend cannot be initialized.
    pub fn new(options: NetOptions) -> NetResult<Self> {
        let inner = Client::builder()
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .build()?;
        Ok(Self { inner, options })
    }

    pub fn options(&self) -> &NetOptions {
        &self.options
    }
}

#[async_trait]
impl Net for HttpClient {
    async fn get_bytes(&self, url: &Url) -> NetResult<Bytes> {
        let resp = self
            .inner
            .get(url.clone())
            .timeout(self.options.request_timeout)
            .send()
            .await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(NetError::http_status(status.as_u16(), url.as_str()));
        }

        resp.bytes().await.map_err(NetError::from)
    }
}
