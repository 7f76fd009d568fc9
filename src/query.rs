//! Search query representation.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Result, SearchError};

/// Results served per page by the engine.
pub const RESULTS_PER_PAGE: u32 = 10;

static TIME_WINDOW_RE: OnceLock<Regex> = OnceLock::new();

fn time_window_re() -> &'static Regex {
    TIME_WINDOW_RE.get_or_init(|| {
        Regex::new(r"^(?P<unit>[adhmnwy])(?P<magnitude>\d+)?$").expect("static regex is valid")
    })
}

/// Rewrites a raw query into the form the engine expects in `q=`.
///
/// Spaces and literal `%20` become `+`, double quotes become `%22`.
/// Everything else, including `:` in operators like `site:`, is left alone.
pub fn normalize_query(raw: &str) -> String {
    raw.replace("%20", "+").replace(' ', "+").replace('"', "%22")
}

/// A search query, normalized once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The query as supplied by the caller.
    pub query: String,
    normalized: String,
}

impl SearchQuery {
    /// Creates a query. Empty or whitespace-only input is rejected.
    pub fn new(query: impl Into<String>) -> Result<Self> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery("Query cannot be empty".into()));
        }
        let normalized = normalize_query(&query);
        Ok(Self { query, normalized })
    }

    /// The value sent as the `q` parameter.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// Recency filter sent as `tbs=qdr:<window>`.
///
/// A unit letter (`a`ny, `d`ay, `h`our, `m`onth, mi`n`ute, `w`eek, `y`ear)
/// optionally followed by a positive magnitude, e.g. `w2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeWindow {
    unit: char,
    magnitude: Option<u32>,
}

impl TimeWindow {
    /// No recency restriction.
    pub const ANY: TimeWindow = TimeWindow {
        unit: 'a',
        magnitude: None,
    };

    /// The unit letter.
    pub fn unit(&self) -> char {
        self.unit
    }

    /// The optional magnitude.
    pub fn magnitude(&self) -> Option<u32> {
        self.magnitude
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::ANY
    }
}

impl FromStr for TimeWindow {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SearchError::InvalidTimeWindow(s.to_string());
        let caps = time_window_re().captures(s).ok_or_else(invalid)?;
        let unit = caps["unit"].chars().next().ok_or_else(invalid)?;
        let magnitude = match caps.name("magnitude") {
            Some(m) => {
                let n: u32 = m.as_str().parse().map_err(|_| invalid())?;
                if n == 0 {
                    return Err(invalid());
                }
                Some(n)
            }
            None => None,
        };
        Ok(Self { unit, magnitude })
    }
}

impl TryFrom<String> for TimeWindow {
    type Error = SearchError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeWindow> for String {
    fn from(window: TimeWindow) -> Self {
        window.to_string()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.magnitude {
            Some(n) => write!(f, "{}{}", self.unit, n),
            None => write!(f, "{}", self.unit),
        }
    }
}

/// One page of one query. Recomputed for every fetch.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub query: &'a SearchQuery,
    /// Page index relative to the caller's offset.
    pub page: u32,
    /// Caller-supplied page offset.
    pub offset: u32,
    pub time_window: TimeWindow,
}

impl PageRequest<'_> {
    /// Result offset sent as `start`, or `None` past the last addressable page.
    pub fn start(&self) -> Option<u32> {
        self.page
            .checked_add(self.offset)?
            .checked_mul(RESULTS_PER_PAGE)
    }

    /// Builds the results-page URL on the given host.
    pub fn url(&self, host: &str) -> Result<Url> {
        let start = self.start().ok_or_else(|| {
            SearchError::InvalidQuery(format!(
                "page {} with offset {} is out of range",
                self.page, self.offset
            ))
        })?;
        let raw = format!(
            "https://{}/search?start={}&tbs=qdr:{}&q={}&filter=0",
            host,
            start,
            self.time_window,
            self.query.normalized()
        );
        Ok(Url::parse(&raw)?)
    }
}

fn default_pages() -> u32 {
    1
}

fn default_delay() -> Duration {
    Duration::from_millis(1000)
}

fn default_max_pool_cycles() -> usize {
    1
}

/// Pagination and retry settings shared by every query of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Pages to fetch per query unless `all_pages` is set.
    #[serde(default = "default_pages")]
    pub pages: u32,
    /// Page offset to start from.
    #[serde(default)]
    pub offset: u32,
    /// Keep paging until an empty page, ignoring `pages`.
    #[serde(default)]
    pub all_pages: bool,
    /// Sleep between successful page fetches.
    #[serde(default = "default_delay")]
    pub delay: Duration,
    #[serde(default)]
    pub time_window: TimeWindow,
    /// Drop social-media and video hosts from results.
    #[serde(default)]
    pub exclude_junk: bool,
    /// Full passes over the proxy pool allowed for a single page.
    #[serde(default = "default_max_pool_cycles")]
    pub max_pool_cycles: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            pages: default_pages(),
            offset: 0,
            all_pages: false,
            delay: default_delay(),
            time_window: TimeWindow::ANY,
            exclude_junk: false,
            max_pool_cycles: default_max_pool_cycles(),
        }
    }
}

impl SearchOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page count.
    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = pages;
        self
    }

    /// Sets the page offset.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Fetch until the engine runs out of results.
    pub fn with_all_pages(mut self, all_pages: bool) -> Self {
        self.all_pages = all_pages;
        self
    }

    /// Sets the inter-request delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the time window.
    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = window;
        self
    }

    /// Enables the junk-host filter.
    pub fn with_exclude_junk(mut self, exclude: bool) -> Self {
        self.exclude_junk = exclude;
        self
    }

    /// Sets how many full pool passes a page may take. Zero is treated as one.
    pub fn with_max_pool_cycles(mut self, cycles: usize) -> Self {
        self.max_pool_cycles = cycles;
        self
    }
}
