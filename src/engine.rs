//! Engine endpoint configuration and response classification.

use serde::{Deserialize, Serialize};

use crate::LinkEntry;

/// Maps a results page to link entries.
///
/// Implementations never fail: a container that cannot be read is skipped,
/// and a page without containers yields an empty vector.
pub trait ResultMatcher: Send + Sync {
    /// Extracts entries in document order.
    fn extract(&self, html: &str) -> Vec<LinkEntry>;
}

/// What a received body turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// A results page; hand it to the extractor.
    Ok,
    /// The engine says the query has no (more) results.
    NoResults,
    /// Anti-automation challenge.
    Blocked,
    /// An engine error page, or not an engine page at all.
    Malformed(MalformedKind),
}

/// Why a body was classified as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// The body carries an engine error marker.
    ErrorPage,
    /// The engine-identifying substring is missing.
    NotEnginePage,
}

impl MalformedKind {
    /// Short human-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            MalformedKind::ErrorPage => "engine returned an error page",
            MalformedKind::NotEnginePage => "response is not a search engine page",
        }
    }
}

/// Endpoint and markup markers of the target engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Host serving `/search`.
    #[serde(default = "default_host")]
    pub host: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Markup of the anti-automation challenge page.
    ///
    /// Matched against raw HTML, so attribute forms only hit real markup and
    /// not query text or result links that mention the same words.
    #[serde(default = "default_blocked_markers")]
    pub blocked_markers: Vec<String>,
    /// Substrings of the engine's generic error page.
    #[serde(default = "default_error_markers")]
    pub error_markers: Vec<String>,
    /// Substring every genuine engine page contains (case-insensitive).
    #[serde(default = "default_identity_marker")]
    pub identity_marker: String,
    /// Substring of the "no results" notice.
    #[serde(default = "default_no_results_marker")]
    pub no_results_marker: String,
}

fn default_host() -> String {
    "www.google.com".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_blocked_markers() -> Vec<String> {
    vec![
        r#"action="/sorry/index""#.to_string(),
        r#"href="/sorry/index"#.to_string(),
        r#"id="captcha-form""#.to_string(),
        r#"class="g-recaptcha""#.to_string(),
    ]
}

fn default_error_markers() -> Vec<String> {
    vec!["That’s an error.".to_string(), "That's an error.".to_string()]
}

fn default_identity_marker() -> String {
    "google".to_string()
}

fn default_no_results_marker() -> String {
    "did not match any documents".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            timeout: default_timeout(),
            blocked_markers: default_blocked_markers(),
            error_markers: default_error_markers(),
            identity_marker: default_identity_marker(),
            no_results_marker: default_no_results_marker(),
        }
    }
}

impl EngineConfig {
    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Classifies a received body.
    ///
    /// Blocked wins over malformed: the challenge page is also missing the
    /// usual engine markup.
    pub fn classify(&self, body: &str) -> PageStatus {
        if self.blocked_markers.iter().any(|m| body.contains(m.as_str())) {
            return PageStatus::Blocked;
        }
        if self.error_markers.iter().any(|m| body.contains(m.as_str())) {
            return PageStatus::Malformed(MalformedKind::ErrorPage);
        }
        if !body
            .to_lowercase()
            .contains(&self.identity_marker.to_lowercase())
        {
            return PageStatus::Malformed(MalformedKind::NotEnginePage);
        }
        if body.contains(self.no_results_marker.as_str()) {
            return PageStatus::NoResults;
        }
        PageStatus::Ok
    }
}
