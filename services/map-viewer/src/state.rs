//! Application state and shared resources.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use storage::{FetchCache, Fetcher, HttpFetcher, SourceClient};

/// Shared application state.
pub struct AppState {
    /// Source client over the process-wide fetch cache.
    pub sources: SourceClient,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// State backed by HTTP fetching.
    ///
    /// A non-empty `allowed_hosts` limits outbound requests to those hosts
    /// plus the gist API host.
    pub fn new(gist_api: &str, request_timeout: Duration, allowed_hosts: &[String]) -> Result<Self> {
        let fetcher = HttpFetcher::new(request_timeout)?
            .with_allowed_hosts(allowed_hosts)
            .allowing_host_of(gist_api);
        Ok(Self::with_fetcher(Arc::new(fetcher), gist_api))
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, gist_api: &str) -> Self {
        let sources = SourceClient::new(fetcher, Arc::new(FetchCache::new())).with_gist_api(gist_api);
        Self {
            sources,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
