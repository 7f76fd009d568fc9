//! Search orchestration: pagination, proxy rotation and run outcomes.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

use crate::engine::PageStatus;
use crate::engines::GoogleResultMatcher;
use crate::fetcher::PageFetcher;
use crate::headers::parse_headers;
use crate::proxy::ProxyPool;
use crate::{
    EngineConfig, LinkEntry, PageRequest, QueryResult, Result, ResultMatcher, RunOutcome,
    RunResult, SearchError, SearchOptions, SearchQuery,
};

/// Runs queries page by page against one engine.
///
/// Queries are processed one after another and pages strictly in order; at
/// most one request is in flight. A configured proxy pool is rotated on
/// every failed fetch and kept on the same proxy after a successful one.
pub struct Search {
    engine: EngineConfig,
    options: SearchOptions,
    headers: HeaderMap,
    fetcher: Arc<dyn PageFetcher>,
    matcher: Arc<dyn ResultMatcher>,
    proxy_pool: Option<ProxyPool>,
}

impl Search {
    /// Creates a search with default engine, options and headers.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        Ok(Self {
            engine: EngineConfig::default(),
            options: SearchOptions::default(),
            headers: parse_headers::<&str>(&[])?,
            fetcher,
            matcher: Arc::new(GoogleResultMatcher::new()),
            proxy_pool: None,
        })
    }

    /// Sets the engine configuration.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Sets pagination and retry options.
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the request headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Replaces the result matcher.
    pub fn with_matcher<M: ResultMatcher + 'static>(mut self, matcher: M) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    /// Sets the proxy pool. An empty pool means direct connections.
    pub fn set_proxy_pool(&mut self, proxy_pool: ProxyPool) {
        self.proxy_pool = (!proxy_pool.is_empty()).then_some(proxy_pool);
    }

    /// Returns the proxy pool if configured.
    pub fn proxy_pool(&self) -> Option<&ProxyPool> {
        self.proxy_pool.as_ref()
    }

    /// Returns the options.
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Runs every query in order.
    ///
    /// All queries are validated before the first request. A failure that
    /// cannot be recovered by rotating proxies ends the whole run; queries
    /// that already finished are kept in the returned outcome.
    pub async fn run<S: AsRef<str>>(&mut self, queries: &[S]) -> RunOutcome {
        let queries = match self.prepare(queries) {
            Ok(queries) => queries,
            Err(e) => {
                return RunOutcome::ConfigurationError {
                    reason: e.to_string(),
                }
            }
        };

        let mut completed = RunResult::new();
        for query in &queries {
            match self.search_query(query).await {
                Ok(result) => completed.push(result),
                Err(e) => {
                    warn!("Query \"{}\" aborted the run: {}", query.query, e);
                    return Self::failure(e, completed);
                }
            }
        }
        RunOutcome::Success(completed)
    }

    fn prepare<S: AsRef<str>>(&self, queries: &[S]) -> Result<Vec<SearchQuery>> {
        if queries.is_empty() {
            return Err(SearchError::InvalidQuery("No queries given".into()));
        }
        let queries = queries
            .iter()
            .map(|q| SearchQuery::new(q.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        for query in &queries {
            self.page_request(query, 0).url(&self.engine.host)?;
        }
        Ok(queries)
    }

    fn failure(error: SearchError, completed: RunResult) -> RunOutcome {
        match error {
            SearchError::Blocked => RunOutcome::Blocked { completed },
            SearchError::Malformed(reason) => RunOutcome::MalformedResponse { completed, reason },
            SearchError::Transport(reason) => RunOutcome::TransportFailure { completed, reason },
            SearchError::ProxiesExhausted { attempts } => {
                RunOutcome::ProxiesExhausted { completed, attempts }
            }
            other if other.is_configuration() => RunOutcome::ConfigurationError {
                reason: other.to_string(),
            },
            other => RunOutcome::TransportFailure {
                completed,
                reason: other.to_string(),
            },
        }
    }

    fn page_request<'a>(&self, query: &'a SearchQuery, page: u32) -> PageRequest<'a> {
        PageRequest {
            query,
            page,
            offset: self.options.offset,
            time_window: self.options.time_window,
        }
    }

    fn wants_page(&self, page: u32) -> bool {
        self.options.all_pages || page < self.options.pages
    }

    fn retry_limit(&self) -> usize {
        let pool_len = self.proxy_pool.as_ref().map_or(0, ProxyPool::len);
        pool_len * self.options.max_pool_cycles.max(1)
    }

    /// Collects every page of one query.
    ///
    /// Stops after the configured page count (unless `all_pages`), at the
    /// first page without results, or when `start` would overflow. Failed fetches are retried on the next
    /// proxy without advancing the page or sleeping.
    pub async fn search_query(&mut self, query: &SearchQuery) -> Result<QueryResult> {
        let mut result = QueryResult::new(&query.query);
        let mut page = 0;
        let mut failures = 0;

        while self.wants_page(page) {
            let request = self.page_request(query, page);
            if page > 0 && request.start().is_none() {
                debug!("\"{}\" reached the last addressable page", query.query);
                break;
            }
            let entries = match self.fetch_page(&request).await {
                Ok(entries) => {
                    failures = 0;
                    entries
                }
                Err(e) if e.is_retryable() && self.proxy_pool.is_some() => {
                    failures += 1;
                    if failures >= self.retry_limit() {
                        warn!("Giving up on page {} of \"{}\": {}", page, query.query, e);
                        return Err(SearchError::ProxiesExhausted { attempts: failures });
                    }
                    warn!("Page {} of \"{}\" failed ({}), rotating proxy", page, query.query, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if entries.is_empty() {
                debug!("Page {} of \"{}\" has no results", page, query.query);
                break;
            }

            debug!("Page {} of \"{}\" yielded {} entries", page, query.query, entries.len());
            result.extend(self.filter(entries));
            page += 1;

            if self.wants_page(page) && !self.options.delay.is_zero() {
                sleep(self.options.delay).await;
            }
        }

        info!("Query \"{}\" finished with {} entries", query.query, result.len());
        Ok(result)
    }

    fn filter(&self, entries: Vec<LinkEntry>) -> Vec<LinkEntry> {
        if !self.options.exclude_junk {
            return entries;
        }
        entries.into_iter().filter(|entry| !entry.is_junk()).collect()
    }

    /// One fetch + classify + extract step.
    async fn fetch_page(&mut self, request: &PageRequest<'_>) -> Result<Vec<LinkEntry>> {
        let url = request.url(&self.engine.host)?;
        let proxy = self
            .proxy_pool
            .as_mut()
            .and_then(|pool| pool.next_proxy())
            .cloned();

        match &proxy {
            Some(proxy) => debug!("Fetching {} via {}", url, proxy.url()),
            None => debug!("Fetching {}", url),
        }

        let limit = Duration::from_secs(self.engine.timeout);
        let page = timeout(limit, self.fetcher.fetch(&url, &self.headers, proxy.as_ref()))
            .await
            .map_err(|_| {
                SearchError::Transport(format!("request timed out after {}s", limit.as_secs()))
            })??;

        let entries = match self.engine.classify(&page.body) {
            PageStatus::Blocked => return Err(SearchError::Blocked),
            PageStatus::Malformed(kind) => {
                return Err(SearchError::Malformed(format!(
                    "{} (HTTP {})",
                    kind.reason(),
                    page.status
                )))
            }
            PageStatus::NoResults => Vec::new(),
            PageStatus::Ok => self.matcher.extract(&page.body),
        };

        if let Some(pool) = self.proxy_pool.as_mut() {
            pool.hold();
        }
        Ok(entries)
    }
}
