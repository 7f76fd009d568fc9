//! # degoogle
//!
//! Scrapes search engine result pages into structured `(url, description)`
//! entries, page by page and query by query.
//!
//! The library is built from three parts:
//!
//! - a [`PageFetcher`](fetcher::PageFetcher) that performs one GET per page,
//!   optionally through a proxy
//! - a [`ResultMatcher`] that turns a results page into [`LinkEntry`] values
//! - the [`Search`] controller that paginates, rotates proxies on failure and
//!   reports a [`RunOutcome`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use degoogle::{fetcher_http::HttpFetcher, RunOutcome, Search, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = Arc::new(HttpFetcher::new()?);
//!     let mut search = Search::new(fetcher)?.with_options(SearchOptions::new().with_pages(2));
//!
//!     match search.run(&["site:docs.rs tokio"]).await {
//!         RunOutcome::Success(results) => println!("{}", results.to_text(false)),
//!         other => eprintln!("search failed: {:?}", other),
//!     }
//!     Ok(())
//! }
//! ```

mod engine;
mod error;
mod query;
mod result;
mod search;

pub mod engines;
pub mod fetcher;
pub mod fetcher_http;
pub mod headers;
pub mod proxy;

pub use engine::{EngineConfig, MalformedKind, PageStatus, ResultMatcher};
pub use error::{Result, SearchError};
pub use query::{normalize_query, PageRequest, SearchOptions, SearchQuery, TimeWindow};
pub use result::{LinkEntry, QueryResult, RunOutcome, RunResult, JUNK_HOSTS, NO_DESCRIPTION};
pub use search::Search;
