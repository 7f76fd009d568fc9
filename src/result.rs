//! Search result types.

use serde::{Deserialize, Serialize};

/// Description used when a result block carries no snippet.
pub const NO_DESCRIPTION: &str = "No description available.";

/// Hosts dropped when junk exclusion is enabled.
pub const JUNK_HOSTS: &[&str] = &[
    "facebook.com/",
    "pinterest.com/",
    "quora.com/",
    "youtube.com/",
    "youtu.be/",
];

/// A single extracted result link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Destination URL.
    pub url: String,
    /// Snippet text, or [`NO_DESCRIPTION`].
    pub description: String,
}

impl LinkEntry {
    /// Creates an entry with a description.
    pub fn new(url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: description.into(),
        }
    }

    /// Creates an entry carrying the sentinel description.
    pub fn without_description(url: impl Into<String>) -> Self {
        Self::new(url, NO_DESCRIPTION)
    }

    /// Returns whether the description is the sentinel.
    pub fn has_description(&self) -> bool {
        self.description != NO_DESCRIPTION
    }

    /// Returns whether the URL points at one of [`JUNK_HOSTS`].
    pub fn is_junk(&self) -> bool {
        JUNK_HOSTS.iter().any(|host| self.url.contains(host))
    }
}

/// All entries collected for one query, in page then document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// The query as supplied by the caller.
    pub query: String,
    entries: Vec<LinkEntry>,
}

impl QueryResult {
    /// Creates an empty result for a query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            entries: Vec::new(),
        }
    }

    /// Appends one page worth of entries.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = LinkEntry>) {
        self.entries.extend(entries);
    }

    /// Returns the entries.
    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no entries were collected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-query results of a run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    queries: Vec<QueryResult>,
}

impl RunResult {
    /// Creates an empty run result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a finished query.
    pub fn push(&mut self, result: QueryResult) {
        self.queries.push(result);
    }

    /// Returns the finished queries.
    pub fn queries(&self) -> &[QueryResult] {
        &self.queries
    }

    /// Total entries across all queries.
    pub fn total(&self) -> usize {
        self.queries.iter().map(QueryResult::len).sum()
    }

    /// Returns whether no query produced any entry.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Renders plain text grouped by query.
    ///
    /// Each group opens with `-- <query> (<n> results) --`; each entry is the
    /// description line (skipped when `urls_only`) followed by the URL line.
    /// Queries without entries are omitted.
    pub fn to_text(&self, urls_only: bool) -> String {
        let mut groups = Vec::new();
        for result in self.queries.iter().filter(|r| !r.is_empty()) {
            let mut group = format!("-- {} ({} results) --\n", result.query, result.len());
            let entries: Vec<String> = result
                .entries()
                .iter()
                .map(|entry| {
                    if urls_only {
                        entry.url.clone()
                    } else {
                        format!("{}\n{}", entry.description, entry.url)
                    }
                })
                .collect();
            let separator = if urls_only { "\n" } else { "\n\n" };
            group.push('\n');
            group.push_str(&entries.join(separator));
            groups.push(group);
        }
        groups.join("\n\n")
    }
}

/// How a run ended.
///
/// Failure variants carry the queries that finished before the failure; the
/// query that was in progress contributes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every query ran to completion.
    Success(RunResult),
    /// The engine blocked a request and no proxy pool was configured.
    Blocked { completed: RunResult },
    /// A response was not a results page and no proxy pool was configured.
    MalformedResponse { completed: RunResult, reason: String },
    /// The network failed and no proxy pool was configured.
    TransportFailure { completed: RunResult, reason: String },
    /// Every proxy in the pool failed for the same page.
    ProxiesExhausted { completed: RunResult, attempts: usize },
    /// Input was rejected before any request was sent.
    ConfigurationError { reason: String },
}

impl RunOutcome {
    /// Returns whether every query completed.
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success(_))
    }

    /// Results gathered before the run ended, whatever the outcome.
    pub fn results(&self) -> Option<&RunResult> {
        match self {
            RunOutcome::Success(results)
            | RunOutcome::Blocked { completed: results }
            | RunOutcome::MalformedResponse { completed: results, .. }
            | RunOutcome::TransportFailure { completed: results, .. }
            | RunOutcome::ProxiesExhausted { completed: results, .. } => Some(results),
            RunOutcome::ConfigurationError { .. } => None,
        }
    }
}
