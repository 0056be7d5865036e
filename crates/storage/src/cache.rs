//! Memoized fetch layer.
//!
//! Every remote document is fetched at most once per cache lifetime. The
//! cache holds one [`OnceCell`] per key: concurrent callers for the same key
//! wait on the first caller's load instead of issuing their own request. A
//! failed load drops its empty cell, so the next caller retries and failing
//! keys never accumulate.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::TryFutureExt;
use map_common::MapResult;
use metrics::counter;
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

/// Kind of remote source, the first half of a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Json,
    Gist,
    Spreadsheet,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Json => "json",
            SourceKind::Gist => "gist",
            SourceKind::Spreadsheet => "spreadsheet",
        }
    }
}

/// Cache key, displayed as `<kind>-<identifier>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: SourceKind,
    pub id: String,
}

impl CacheKey {
    pub fn new(kind: SourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.as_str(), self.id)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

type Slot = Arc<OnceCell<Arc<Value>>>;

/// Process-lifetime cache of fetched JSON payloads.
#[derive(Debug, Default)]
pub struct FetchCache {
    entries: Mutex<HashMap<String, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the payload stored under `key`, running `loader` if no payload
    /// has been stored yet.
    pub async fn fetch<F, Fut>(&self, key: &CacheKey, loader: F) -> MapResult<Arc<Value>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MapResult<Value>>,
    {
        let name = key.to_string();
        let slot = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(name.clone()).or_default())
        };

        let loaded = AtomicBool::new(false);
        let payload = match slot
            .get_or_try_init(|| {
                loaded.store(true, Ordering::SeqCst);
                loader().map_ok(Arc::new)
            })
            .await
        {
            Ok(payload) => payload,
            Err(err) => {
                self.evict_empty(&name, &slot).await;
                return Err(err);
            }
        };

        if loaded.load(Ordering::SeqCst) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            counter!("gistmap_fetch_cache_misses_total").increment(1);
            debug!(key = %name, "Fetch cache miss");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            counter!("gistmap_fetch_cache_hits_total").increment(1);
            debug!(key = %name, "Fetch cache hit");
        }

        Ok(Arc::clone(payload))
    }

    async fn evict_empty(&self, name: &str, slot: &Slot) {
        let mut entries = self.entries.lock().await;
        let stale = entries
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized());
        if stale {
            entries.remove(name);
            debug!(key = %name, "Dropped empty fetch cache slot");
        }
    }

    /// Whether a payload is stored under `key`.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .lock()
            .await
            .get(&key.to_string())
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of stored payloads.
    pub async fn len(&self) -> usize {
        self.entries
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
