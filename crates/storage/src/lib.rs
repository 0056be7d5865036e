//! Fetching and caching for gistmap.
//!
//! Provides:
//! - The [`Fetcher`] trait with an HTTP implementation and an in-memory one
//! - [`FetchCache`], a coalescing memo of fetched payloads
//! - [`SourceClient`] for JSON documents, gists and spreadsheet rows
//! - [`Provider`] resolution of the map configuration

pub mod cache;
pub mod fetcher;
pub mod provider;
pub mod sources;

pub use cache::{CacheKey, CacheStats, FetchCache, SourceKind};
pub use fetcher::{Fetcher, HttpFetcher, MemoryFetcher};
pub use provider::{config_from_gist, Provider, CONFIG_FILE};
pub use sources::{rows_from_csv, DataSource, SourceClient, DEFAULT_GIST_API};
