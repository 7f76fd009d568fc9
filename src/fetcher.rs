//! Page fetcher abstraction for retrieving result pages.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use url::Url;

use crate::proxy::ProxyConfig;
use crate::Result;

/// A body received from the engine, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl FetchedPage {
    /// Creates a page.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Trait for performing one GET against the engine.
///
/// Implementations must report connection, TLS, proxy and timeout failures
/// as [`SearchError::Transport`](crate::SearchError::Transport). Any received
/// body, whatever its status, is returned as a [`FetchedPage`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` with the given headers, through `proxy` when set.
    async fn fetch(
        &self,
        url: &Url,
        headers: &HeaderMap,
        proxy: Option<&ProxyConfig>,
    ) -> Result<FetchedPage>;
}
