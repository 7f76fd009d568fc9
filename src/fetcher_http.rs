//! HTTP-based page fetcher using reqwest.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::fetcher::{FetchedPage, PageFetcher};
use crate::proxy::ProxyConfig;
use crate::{Result, SearchError};

/// Per-request timeout applied to every fetch.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A page fetcher that uses plain HTTP requests via reqwest.
///
/// Keeps one direct client plus one client per proxy endpoint it has used.
pub struct HttpFetcher {
    timeout: Duration,
    direct: Client,
    proxied: Mutex<HashMap<String, Client>>,
}

impl HttpFetcher {
    /// Creates an `HttpFetcher` with the default 10 second timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Creates an `HttpFetcher` with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self {
            timeout,
            direct: Self::builder(timeout).build()?,
            proxied: Mutex::new(HashMap::new()),
        })
    }

    fn builder(timeout: Duration) -> reqwest::ClientBuilder {
        Client::builder().timeout(timeout).connect_timeout(timeout)
    }

    fn client_for(&self, proxy: Option<&ProxyConfig>) -> Result<Client> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };

        let key = proxy.url();
        let mut proxied = self
            .proxied
            .lock()
            .map_err(|_| SearchError::Transport("proxy client cache poisoned".to_string()))?;
        if let Some(client) = proxied.get(&key) {
            return Ok(client.clone());
        }

        debug!("Building client for proxy {}", key);
        let client = Self::builder(self.timeout)
            .proxy(proxy.to_reqwest()?)
            .build()?;
        proxied.insert(key, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &Url,
        headers: &HeaderMap,
        proxy: Option<&ProxyConfig>,
    ) -> Result<FetchedPage> {
        let client = self.client_for(proxy)?;

        let response = client
            .get(url.clone())
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(FetchedPage::new(status, body))
    }
}
