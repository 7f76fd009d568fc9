//! End-to-end runs against an in-memory engine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tokio_test::{assert_err, assert_ok};
use url::Url;

use degoogle::fetcher::{FetchedPage, PageFetcher};
use degoogle::headers::parse_headers;
use degoogle::proxy::{parse_proxy_list, ProxyConfig, ProxyPool};
use degoogle::{RunOutcome, Search, SearchOptions, NO_DESCRIPTION};

/// One recorded request.
#[derive(Debug, Clone)]
struct Call {
    url: Url,
    user_agent: Option<String>,
    proxy: Option<String>,
}

/// Serves `entries_per_start[start]` results for each `start` offset, an
/// empty page for anything else, and a block page for blocked routes.
#[derive(Default)]
struct FakeEngine {
    entries_per_start: HashMap<String, usize>,
    blocked_proxies: Vec<String>,
    block_direct: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeEngine {
    fn with_pages(pages: &[(u32, usize)]) -> Self {
        Self {
            entries_per_start: pages
                .iter()
                .map(|(start, n)| (start.to_string(), *n))
                .collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn page(query: &str, start: &str, count: usize) -> String {
        let blocks: String = (0..count)
            .map(|i| {
                let description = if i % 2 == 0 {
                    format!(r#"<div data-content-feature="1"><div>{query} result {i}</div></div>"#)
                } else {
                    String::new()
                };
                format!(
                    r#"<div class="g"><div><div><div><a href="https://r{start}-{i}.example/"><h3>t</h3></a></div></div></div>{description}</div>"#
                )
            })
            .collect();
        format!("<html><head><title>{query} - Google Search</title></head><body>{blocks}</body></html>")
    }
}

#[async_trait]
impl PageFetcher for FakeEngine {
    async fn fetch(
        &self,
        url: &Url,
        headers: &HeaderMap,
        proxy: Option<&ProxyConfig>,
    ) -> degoogle::Result<FetchedPage> {
        self.calls.lock().unwrap().push(Call {
            url: url.clone(),
            user_agent: headers
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            proxy: proxy.map(ProxyConfig::url),
        });

        let via = proxy.map(ProxyConfig::url);
        let blocked = match &via {
            Some(p) => self.blocked_proxies.contains(p),
            None => self.block_direct,
        };
        if blocked {
            return Ok(FetchedPage::new(
                429,
                r#"<html><body><form action="/sorry/index"></form></body></html>"#,
            ));
        }

        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        let start = params.get("start").cloned().unwrap_or_default();
        let query = params.get("q").cloned().unwrap_or_default();
        let count = self.entries_per_start.get(&start).copied().unwrap_or(0);
        Ok(FetchedPage::new(200, Self::page(&query, &start, count)))
    }
}

fn options() -> SearchOptions {
    SearchOptions::new().with_delay(Duration::ZERO)
}

#[tokio::test]
async fn test_single_page_request_shape() {
    let engine = Arc::new(FakeEngine::with_pages(&[(0, 2)]));
    let mut search = Search::new(engine.clone())
        .unwrap()
        .with_options(options().with_pages(1).with_offset(0));

    let outcome = search.run(&["site:example.com test"]).await;
    assert!(outcome.is_success());

    let calls = engine.calls();
    assert_eq!(calls.len(), 1);
    let url = calls[0].url.as_str();
    assert!(url.starts_with("https://www.google.com/search?"));
    assert!(url.contains("start=0&"));
    assert!(url.contains("tbs=qdr:a&"));
    assert!(url.contains("&q=site:example.com+test&"));
    assert!(url.ends_with("&filter=0"));
}

#[tokio::test]
async fn test_two_queries_stop_on_empty_second_page() {
    let engine = Arc::new(FakeEngine::with_pages(&[(0, 3)]));
    let mut search = Search::new(engine.clone())
        .unwrap()
        .with_options(options().with_pages(2));

    let outcome = search.run(&["first query", "second query"]).await;
    let RunOutcome::Success(results) = outcome else {
        panic!("expected success");
    };

    assert_eq!(results.queries().len(), 2);
    assert_eq!(results.queries()[0].query, "first query");
    assert_eq!(results.queries()[1].query, "second query");
    for query in results.queries() {
        assert_eq!(query.len(), 3);
    }
    // Two fetches per query: a full page, then the empty one.
    assert_eq!(engine.calls().len(), 4);
}

#[tokio::test]
async fn test_descriptions_and_sentinel() {
    let engine = Arc::new(FakeEngine::with_pages(&[(0, 2)]));
    let mut search = Search::new(engine).unwrap().with_options(options());

    let outcome = search.run(&["rust"]).await;
    let results = outcome.results().unwrap();
    let entries = results.queries()[0].entries();
    assert_eq!(entries[0].description, "rust result 0");
    assert_eq!(entries[1].description, NO_DESCRIPTION);
    assert_eq!(entries[0].url, "https://r0-0.example/");
}

#[tokio::test]
async fn test_entries_accumulate_across_pages_in_order() {
    let engine = Arc::new(FakeEngine::with_pages(&[(20, 1), (30, 2), (40, 1)]));
    let mut search = Search::new(engine.clone())
        .unwrap()
        .with_options(options().with_offset(2).with_all_pages(true));

    let outcome = search.run(&["rust"]).await;
    let results = outcome.results().unwrap();
    let urls: Vec<_> = results.queries()[0]
        .entries()
        .iter()
        .map(|e| e.url.as_str())
        .collect();
    assert_eq!(
        urls,
        vec![
            "https://r20-0.example/",
            "https://r30-0.example/",
            "https://r30-1.example/",
            "https://r40-0.example/"
        ]
    );
    // Three pages with results plus the empty one at start=50.
    assert_eq!(engine.calls().len(), 4);
}

#[tokio::test]
async fn test_blocked_without_proxy_ends_run() {
    let engine = Arc::new(FakeEngine {
        block_direct: true,
        ..FakeEngine::with_pages(&[(0, 3)])
    });
    let mut search = Search::new(engine.clone())
        .unwrap()
        .with_options(options().with_pages(3));

    let outcome = search.run(&["first", "second"]).await;
    match outcome {
        RunOutcome::Blocked { completed } => {
            assert!(completed.queries().is_empty());
            assert_eq!(completed.total(), 0);
        }
        other => panic!("expected Blocked, got {other:?}"),
    }
    assert_eq!(engine.calls().len(), 1);
}

#[tokio::test]
async fn test_blocked_proxy_is_skipped_and_working_proxy_sticks() {
    let proxies = parse_proxy_list(
        "<Proxy US 0.2s [HTTPS] 10.0.0.1:8080>\n<Proxy US 0.3s [SOCKS5] 10.0.0.2:1080>\n",
    )
    .unwrap();
    let engine = Arc::new(FakeEngine {
        blocked_proxies: vec!["http://10.0.0.1:8080".to_string()],
        ..FakeEngine::with_pages(&[(0, 1), (10, 1), (20, 1)])
    });
    let mut search = Search::new(engine.clone())
        .unwrap()
        .with_options(options().with_pages(3));
    search.set_proxy_pool(ProxyPool::with_proxies(proxies));

    let outcome = search.run(&["rust"]).await;
    assert_eq!(outcome.results().unwrap().total(), 3);

    let used: Vec<_> = engine
        .calls()
        .into_iter()
        .map(|c| c.proxy.unwrap())
        .collect();
    assert_eq!(
        used,
        vec![
            "http://10.0.0.1:8080",
            "socks5://10.0.0.2:1080",
            "socks5://10.0.0.2:1080",
            "socks5://10.0.0.2:1080"
        ]
    );
}

#[tokio::test]
async fn test_every_proxy_blocked_is_bounded() {
    let proxies = vec![
        ProxyConfig::new("10.0.0.1", 8080),
        ProxyConfig::new("10.0.0.2", 8080),
    ];
    let engine = Arc::new(FakeEngine {
        blocked_proxies: proxies.iter().map(ProxyConfig::url).collect(),
        ..FakeEngine::with_pages(&[(0, 1)])
    });
    let mut search = Search::new(engine.clone())
        .unwrap()
        .with_options(options().with_max_pool_cycles(3));
    search.set_proxy_pool(ProxyPool::with_proxies(proxies));

    let outcome = search.run(&["rust"]).await;
    assert!(matches!(
        outcome,
        RunOutcome::ProxiesExhausted { attempts: 6, .. }
    ));
    assert_eq!(engine.calls().len(), 6);
}

#[tokio::test]
async fn test_custom_headers_reach_fetcher() {
    let engine = Arc::new(FakeEngine::with_pages(&[(0, 1)]));
    let headers = assert_ok!(parse_headers(&["User-Agent: test-agent/1.0"]));
    let mut search = Search::new(engine.clone())
        .unwrap()
        .with_headers(headers)
        .with_options(options());

    search.run(&["rust"]).await;
    assert_eq!(engine.calls()[0].user_agent.as_deref(), Some("test-agent/1.0"));
}

#[tokio::test]
async fn test_configuration_errors_send_nothing() {
    assert_err!(parse_headers(&["no separator"]));
    assert_err!("x9".parse::<degoogle::TimeWindow>());
    assert_err!(parse_proxy_list("<Proxy US 0.2s [HTTP] 10.0.0.1:8080>"));

    let engine = Arc::new(FakeEngine::default());
    let mut search = Search::new(engine.clone()).unwrap().with_options(options());
    let outcome = search.run(&[""]).await;
    assert!(matches!(outcome, RunOutcome::ConfigurationError { .. }));
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_text_rendering_of_run() {
    let engine = Arc::new(FakeEngine::with_pages(&[(0, 1)]));
    let mut search = Search::new(engine).unwrap().with_options(options());

    let outcome = search.run(&["rust"]).await;
    let text = outcome.results().unwrap().to_text(false);
    assert_eq!(
        text,
        "-- rust (1 results) --\n\nrust result 0\nhttps://r0-0.example/"
    );
    let urls = outcome.results().unwrap().to_text(true);
    assert_eq!(urls, "-- rust (1 results) --\n\nhttps://r0-0.example/");
}

#[tokio::test]
async fn test_query_about_captcha_is_not_blocked() {
    let engine = Arc::new(FakeEngine::with_pages(&[(0, 2)]));
    let mut search = Search::new(engine.clone())
        .unwrap()
        .with_options(options().with_pages(2));

    let outcome = search
        .run(&["recaptcha unusual traffic from your computer"])
        .await;
    let RunOutcome::Success(results) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(results.total(), 2);
    assert!(results.queries()[0].entries()[0]
        .description
        .starts_with("recaptcha"));
    assert_eq!(engine.calls().len(), 2);
}
