//! degoogle CLI - scrape search results from the command line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use degoogle::{
    fetcher_http::HttpFetcher,
    headers::parse_headers,
    proxy::{load_proxy_file, ProxyConfig, ProxyPool},
    EngineConfig, RunOutcome, Search, SearchOptions, TimeWindow,
};

const BANNER: &str = r"
     _                             _
  __| | ___  __ _  ___   ___   __ _| | ___
 / _` |/ _ \/ _` |/ _ \ / _ \ / _` | |/ _ \
| (_| |  __/ (_| | (_) | (_) | (_| | |  __/
 \__,_|\___|\__, |\___/ \___/ \__, |_|\___|
            |___/             |___/
";

/// degoogle - extract search results without the tracking
#[derive(Parser)]
#[command(name = "degoogle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Search queries, processed in order
    #[arg(required = true)]
    queries: Vec<String>,

    /// Pages to fetch per query
    #[arg(short, long, default_value = "1")]
    pages: u32,

    /// Page offset to start from
    #[arg(short, long, default_value = "0")]
    offset: u32,

    /// Fetch every page until results run out (overrides --pages)
    #[arg(short, long)]
    all_pages: bool,

    /// Delay between page requests in milliseconds
    #[arg(short, long, default_value = "1000")]
    delay: u64,

    /// Time window: a, d, h, m, n, w or y, optionally followed by a number (e.g. w2)
    #[arg(short, long, default_value = "a")]
    time_window: String,

    /// Print URLs only
    #[arg(short, long)]
    urls_only: bool,

    /// Drop facebook, pinterest, quora and youtube results
    #[arg(short = 'j', long)]
    exclude_junk: bool,

    /// Extra request header, `Name: Value` (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// File with one `[HTTPS] host:port` or `[SOCKS5] host:port` proxy per line
    #[arg(short = 'P', long)]
    proxy_file: Option<PathBuf>,

    /// Proxy URL, e.g. http://127.0.0.1:8080 or socks5://127.0.0.1:1080 (repeatable)
    #[arg(long = "proxy")]
    proxies: Vec<String>,

    /// Full passes over the proxy pool allowed for a single page
    #[arg(long, default_value = "1")]
    max_pool_cycles: usize,

    /// Search host
    #[arg(long, default_value = "www.google.com")]
    host: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Do not print the banner
    #[arg(short = 'B', long)]
    no_banner: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::new("degoogle=debug"))
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    if !cli.no_banner && matches!(cli.format, OutputFormat::Text) {
        eprintln!("{BANNER}");
    }

    let mut search = match build_search(&cli).await {
        Ok(search) => search,
        Err(e) => {
            eprintln!("configuration error: {e:#}");
            return Ok(ExitCode::from(2));
        }
    };

    let outcome = search.run(&cli.queries).await;
    report(&cli, &outcome)
}

async fn build_search(cli: &Cli) -> Result<Search> {
    let time_window: TimeWindow = cli.time_window.parse()?;
    let headers = parse_headers(&cli.headers)?;

    let mut proxies = match &cli.proxy_file {
        Some(path) => load_proxy_file(path)
            .await
            .with_context(|| format!("reading proxy list {}", path.display()))?,
        None => Vec::new(),
    };
    for url in &cli.proxies {
        proxies.push(ProxyConfig::from_url(url)?);
    }

    let engine = EngineConfig::default().with_host(&cli.host);
    let fetcher = HttpFetcher::with_timeout(Duration::from_secs(engine.timeout))?;

    let options = SearchOptions::new()
        .with_pages(cli.pages)
        .with_offset(cli.offset)
        .with_all_pages(cli.all_pages)
        .with_delay(Duration::from_millis(cli.delay))
        .with_time_window(time_window)
        .with_exclude_junk(cli.exclude_junk)
        .with_max_pool_cycles(cli.max_pool_cycles);

    let mut search = Search::new(Arc::new(fetcher))?
        .with_engine(engine)
        .with_headers(headers)
        .with_options(options);

    if !proxies.is_empty() {
        if cli.verbose {
            eprintln!("Using {} proxies", proxies.len());
        }
        search.set_proxy_pool(ProxyPool::with_proxies(proxies));
    }

    Ok(search)
}

fn report(cli: &Cli, outcome: &RunOutcome) -> Result<ExitCode> {
    if matches!(cli.format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(exit_code(outcome));
    }

    if let Some(results) = outcome.results() {
        if results.is_empty() {
            if outcome.is_success() {
                println!("no results");
            }
        } else {
            println!("{}", results.to_text(cli.urls_only));
        }
    }

    match outcome {
        RunOutcome::Success(_) => {}
        RunOutcome::Blocked { .. } => {
            eprintln!("blocked by the search engine; use a proxy (-P/--proxy)")
        }
        RunOutcome::MalformedResponse { reason, .. } => {
            eprintln!("malformed response: {reason}")
        }
        RunOutcome::TransportFailure { reason, .. } => {
            eprintln!("request failed: {reason}")
        }
        RunOutcome::ProxiesExhausted { attempts, .. } => {
            eprintln!("every proxy failed ({attempts} attempts); try a fresh proxy list")
        }
        RunOutcome::ConfigurationError { reason } => {
            eprintln!("configuration error: {reason}")
        }
    }

    Ok(exit_code(outcome))
}

fn exit_code(outcome: &RunOutcome) -> ExitCode {
    match outcome {
        RunOutcome::Success(_) => ExitCode::SUCCESS,
        RunOutcome::Blocked { .. } | RunOutcome::ConfigurationError { .. } => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}
