//! Raw network access.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use map_common::{MapError, MapResult};
use serde_json::Value;
use tracing::{debug, instrument};

/// Fetches documents by URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a URL and return the response body as text.
    async fn get_text(&self, url: &str) -> MapResult<String>;

    /// Fetch a URL and parse the body as JSON.
    async fn get_json(&self, url: &str) -> MapResult<Value> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| MapError::FetchFailed {
            url: url.to_string(),
            message: format!("invalid JSON: {}", e),
        })
    }
}

/// HTTP fetcher backed by a shared reqwest client.
///
/// Only `http` and `https` URLs are fetched. With an allow-list set, the
/// URL's host must also be on it.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    allowed_hosts: Option<HashSet<String>>,
}

impl HttpFetcher {
    /// Build a client whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> MapResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gistmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MapError::FetchFailed {
                url: String::new(),
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            allowed_hosts: None,
        })
    }

    /// Restrict requests to `hosts`. An empty list allows every host.
    pub fn with_allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts: HashSet<String> = hosts
            .into_iter()
            .map(|h| h.as_ref().trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        self.allowed_hosts = (!hosts.is_empty()).then_some(hosts);
        self
    }

    /// Add the host of `url` to the allow-list, if one is set.
    pub fn allowing_host_of(mut self, url: &str) -> Self {
        let host = reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase));
        if let (Some(hosts), Some(host)) = (self.allowed_hosts.as_mut(), host) {
            hosts.insert(host);
        }
        self
    }

    fn check_url(&self, url: &str) -> MapResult<reqwest::Url> {
        let refuse = |message: String| MapError::FetchFailed {
            url: url.to_string(),
            message,
        };

        let parsed = reqwest::Url::parse(url).map_err(|e| refuse(format!("invalid URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(refuse(format!("unsupported URL scheme '{}'", parsed.scheme())));
        }
        if let Some(hosts) = &self.allowed_hosts {
            let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
            if !hosts.contains(&host) {
                return Err(refuse(format!("host '{}' is not allowed", host)));
            }
        }
        Ok(parsed)
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> MapError {
    if err.is_timeout() {
        MapError::Timeout
    } else {
        MapError::FetchFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn get_text(&self, url: &str) -> MapResult<String> {
        let target = self.check_url(url)?;
        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapError::FetchFailed {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let body = response.text().await.map_err(|e| transport_error(url, e))?;
        debug!(bytes = body.len(), "Fetched");
        Ok(body)
    }
}

/// In-memory fetcher serving canned responses.
///
/// Counts requests per URL, and can delay every response to widen race
/// windows. Unknown URLs answer with an HTTP 404 failure.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, Result<String, String>>,
    requests: Mutex<HashMap<String, u64>>,
    total: AtomicU64,
    delay: Option<Duration>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), Ok(body.into()));
        self
    }

    pub fn with_json(self, url: impl Into<String>, body: &Value) -> Self {
        self.with_text(url, body.to_string())
    }

    pub fn with_failure(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses.insert(url.into(), Err(message.into()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests made for `url` so far.
    pub fn requests(&self, url: &str) -> u64 {
        self.requests
            .lock()
            .map(|r| r.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_requests(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn get_text(&self, url: &str) -> MapResult<String> {
        self.total.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            *requests.entry(url.to_string()).or_insert(0) += 1;
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(message)) => Err(MapError::FetchFailed {
                url: url.to_string(),
                message: message.clone(),
            }),
            None => Err(MapError::FetchFailed {
                url: url.to_string(),
                message: "HTTP 404".to_string(),
            }),
        }
    }
}
