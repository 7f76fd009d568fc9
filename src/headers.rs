//! Request header parsing.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::{Result, SearchError};

/// User agent sent unless the caller supplies one. Needed for a full results page.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:94.0) Gecko/20100101 Firefox/94.0";

/// Parses `Name: Value` lines into a header map.
///
/// Each line is split at its first `:`. Names are matched case-insensitively
/// and a later line replaces an earlier one with the same name. The default
/// user agent is added when no line sets `User-Agent`.
pub fn parse_headers<S: AsRef<str>>(lines: &[S]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for line in lines {
        let line = line.as_ref();
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| SearchError::InvalidHeader(format!("missing ':' separator in {line:?}")))?;

        let name = HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes())
            .map_err(|e| SearchError::InvalidHeader(format!("{line:?}: {e}")))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| SearchError::InvalidHeader(format!("{line:?}: {e}")))?;
        headers.insert(name, value);
    }

    if !headers.contains_key(USER_AGENT) {
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    }
    Ok(headers)
}
