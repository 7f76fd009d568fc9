//! Proxy endpoints and the rotating proxy pool.
//!
//! The pool is owned by the search controller and rotated only from there,
//! so the cursor is a plain `usize`.

use std::path::Path;

use reqwest::Proxy as ReqwestProxy;
use tracing::debug;
use url::Url;

use crate::{Result, SearchError};

/// Proxy protocol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyProtocol {
    /// HTTP proxy, used for both HTTP and HTTPS traffic.
    #[default]
    Http,
    /// SOCKS5 proxy.
    Socks5,
}

impl ProxyProtocol {
    fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

/// A single proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy host (IP or domain)
    pub host: String,
    /// Proxy port
    pub port: u16,
    /// Proxy protocol
    pub protocol: ProxyProtocol,
}

impl ProxyConfig {
    /// Creates a new HTTP proxy configuration.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            protocol: ProxyProtocol::Http,
        }
    }

    /// Sets the proxy protocol.
    pub fn with_protocol(mut self, protocol: ProxyProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Returns the proxy URL string.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }

    /// Builds the reqwest proxy covering all outbound traffic.
    pub fn to_reqwest(&self) -> Result<ReqwestProxy> {
        ReqwestProxy::all(self.url())
            .map_err(|e| SearchError::InvalidProxy(format!("{}: {}", self.url(), e)))
    }

    /// Parses a proxy URL such as `http://127.0.0.1:8080` or `socks5://10.0.0.1:1080`.
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)?;

        let protocol = match url.scheme() {
            "http" | "https" => ProxyProtocol::Http,
            "socks5" => ProxyProtocol::Socks5,
            scheme => {
                return Err(SearchError::InvalidProxy(format!(
                    "unsupported proxy scheme: {scheme}"
                )))
            }
        };

        let host = url
            .host_str()
            .ok_or_else(|| SearchError::InvalidProxy(format!("missing proxy host in {raw}")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| SearchError::InvalidProxy(format!("missing proxy port in {raw}")))?;

        Ok(Self::new(host, port).with_protocol(protocol))
    }

    /// Parses one line of a proxy list.
    ///
    /// The line carries a bracketed tag, `HTTPS]` or `SOCKS5]`, then a space
    /// and `host:port`, optionally closed by `>` as in
    /// `<Proxy US 0.21s [HTTPS] 1.2.3.4:8080>`. Blank lines yield `None`.
    pub fn from_list_line(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (protocol, rest) = if let Some((_, rest)) = line.split_once("HTTPS] ") {
            (ProxyProtocol::Http, rest)
        } else if let Some((_, rest)) = line.split_once("SOCKS5] ") {
            (ProxyProtocol::Socks5, rest)
        } else {
            return Err(SearchError::InvalidProxy(format!(
                "expected an HTTPS] or SOCKS5] tag in {line:?}"
            )));
        };

        let address = rest.trim().trim_end_matches('>');
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| SearchError::InvalidProxy(format!("expected host:port in {line:?}")))?;
        let port: u16 = port
            .parse()
            .map_err(|_| SearchError::InvalidProxy(format!("invalid port in {line:?}")))?;
        if host.is_empty() {
            return Err(SearchError::InvalidProxy(format!("missing host in {line:?}")));
        }

        Ok(Some(Self::new(host, port).with_protocol(protocol)))
    }
}

/// Parses a newline-delimited proxy list, skipping blank lines.
pub fn parse_proxy_list(contents: &str) -> Result<Vec<ProxyConfig>> {
    contents
        .lines()
        .filter_map(|line| ProxyConfig::from_list_line(line).transpose())
        .collect()
}

/// Reads and parses a proxy list file.
pub async fn load_proxy_file(path: impl AsRef<Path>) -> Result<Vec<ProxyConfig>> {
    let contents = tokio::fs::read_to_string(path.as_ref()).await?;
    let proxies = parse_proxy_list(&contents)?;
    debug!(
        "Loaded {} proxies from {}",
        proxies.len(),
        path.as_ref().display()
    );
    Ok(proxies)
}

/// An ordered proxy pool with a round-robin cursor.
///
/// [`next_proxy`](Self::next_proxy) hands out the proxy under the cursor and
/// advances it, wrapping at the pool length. [`hold`](Self::hold) steps the
/// cursor back so the proxy just used is handed out again.
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    proxies: Vec<ProxyConfig>,
    cursor: usize,
}

impl ProxyPool {
    /// Creates a pool visiting proxies in the given order.
    pub fn with_proxies(proxies: Vec<ProxyConfig>) -> Self {
        Self { proxies, cursor: 0 }
    }

    /// Returns the number of proxies in the pool.
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Returns whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Index of the proxy the next call to `next_proxy` returns.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the proxy under the cursor and advances the cursor.
    pub fn next_proxy(&mut self) -> Option<&ProxyConfig> {
        if self.proxies.is_empty() {
            return None;
        }
        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.proxies.len();
        self.proxies.get(index)
    }

    /// Steps the cursor back by one so the last proxy is reused.
    pub fn hold(&mut self) {
        if !self.proxies.is_empty() {
            self.cursor = (self.cursor + self.proxies.len() - 1) % self.proxies.len();
        }
    }
}
