//! Error types for the search library.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Time window is not one of `a d h m n w y` with an optional magnitude.
    #[error("Invalid time window: {0}")]
    InvalidTimeWindow(String),

    /// Header line could not be parsed.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Proxy line or proxy scheme is not supported.
    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),

    /// Result-block selector could not be parsed.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Invalid query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Proxy list could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection, TLS, proxy or timeout failure before a body was received.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The engine served its anti-automation challenge.
    #[error("Blocked by the search engine; use a proxy")]
    Blocked,

    /// A body was received but it is not a results page.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Every proxy in the pool failed for the same page.
    #[error("Proxy pool exhausted after {attempts} failed attempts")]
    ProxiesExhausted { attempts: usize },

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl SearchError {
    /// Returns true for errors caused by bad input rather than the network.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidTimeWindow(_)
                | SearchError::InvalidHeader(_)
                | SearchError::InvalidProxy(_)
                | SearchError::InvalidQuery(_)
                | SearchError::InvalidSelector(_)
                | SearchError::UrlParse(_)
                | SearchError::Io(_)
        )
    }

    /// Returns true for failures a proxy rotation may recover from.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SearchError::Transport(_) | SearchError::Blocked | SearchError::Malformed(_)
        )
    }
}
