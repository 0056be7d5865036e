//! Remote attribute and document sources, all routed through the fetch cache.

use std::sync::Arc;

use map_common::{DataTable, MapError, MapResult};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::cache::{CacheKey, FetchCache, SourceKind};
use crate::fetcher::Fetcher;

/// Default base URL of the gist API.
pub const DEFAULT_GIST_API: &str = "https://api.github.com";

const SPREADSHEET_MARKER: &str = "//docs.google.com/spreadsheet";
const SPREADSHEET_HOST: &str = "https://docs.google.com";

/// Where a layer's attribute rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// A spreadsheet document, read through its CSV export.
    Spreadsheet { key: String, export_url: String },
    /// A static JSON array of row objects.
    Json(String),
    Unknown(String),
}

impl DataSource {
    pub fn from_url(url: &str) -> Self {
        if url.contains(SPREADSHEET_MARKER) {
            if let Some((key, export_url)) = spreadsheet_export(url) {
                return DataSource::Spreadsheet { key, export_url };
            }
            return DataSource::Unknown(url.to_string());
        }

        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.ends_with(".json") {
            DataSource::Json(url.to_string())
        } else {
            DataSource::Unknown(url.to_string())
        }
    }
}

/// Derive the spreadsheet key and CSV export URL from a document URL.
///
/// Handles `/spreadsheets/d/<key>/...` (keeping a `gid` sheet selector) and
/// the legacy `/spreadsheet/...?key=<key>` form.
fn spreadsheet_export(url: &str) -> Option<(String, String)> {
    if let Some(rest) = url.split("/spreadsheets/d/").nth(1) {
        let key = rest.split(['/', '?', '#']).next().filter(|k| !k.is_empty())?;
        let mut export = format!("{}/spreadsheets/d/{}/export?format=csv", SPREADSHEET_HOST, key);
        if let Some(gid) = url_param(url, "gid") {
            export.push_str("&gid=");
            export.push_str(gid);
        }
        return Some((key.to_string(), export));
    }

    let key = url_param(url, "key")?;
    let export = format!("{}/spreadsheet/pub?key={}&output=csv", SPREADSHEET_HOST, key);
    Some((key.to_string(), export))
}

/// Value of `name` in the query or fragment part of `url`.
fn url_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let (_, params) = url.split_once(['?', '#'])?;
    params
        .split(['&', '?', '#'])
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

/// Parse a CSV export into a JSON array of row objects.
///
/// Column names are normalized to lowercase with whitespace removed; every
/// cell is kept as a string.
pub fn rows_from_csv(text: &str) -> MapResult<Value> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| MapError::DataReadError(format!("CSV error: {}", e)))?
        .iter()
        .map(|h| h.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| MapError::DataReadError(format!("CSV error: {}", e)))?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, cell)| (h.clone(), Value::String(cell.to_string())))
            .collect();
        rows.push(Value::Object(row));
    }

    Ok(Value::Array(rows))
}

/// Fetches JSON documents, gists and spreadsheets through a shared cache.
#[derive(Clone)]
pub struct SourceClient {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<FetchCache>,
    gist_api: String,
}

impl SourceClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: Arc<FetchCache>) -> Self {
        Self {
            fetcher,
            cache,
            gist_api: DEFAULT_GIST_API.to_string(),
        }
    }

    pub fn with_gist_api(mut self, base: impl Into<String>) -> Self {
        self.gist_api = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn cache(&self) -> &Arc<FetchCache> {
        &self.cache
    }

    pub fn gist_url(&self, id: &str) -> String {
        format!("{}/gists/{}", self.gist_api, id)
    }

    #[instrument(skip(self))]
    pub async fn fetch_json(&self, url: &str) -> MapResult<Arc<Value>> {
        let key = CacheKey::new(SourceKind::Json, url);
        self.cache.fetch(&key, || self.fetcher.get_json(url)).await
    }

    #[instrument(skip(self))]
    pub async fn fetch_gist(&self, id: &str) -> MapResult<Arc<Value>> {
        let key = CacheKey::new(SourceKind::Gist, id);
        let url = self.gist_url(id);
        self.cache.fetch(&key, || self.fetcher.get_json(&url)).await
    }

    /// Rows of a spreadsheet as a JSON array, cached by spreadsheet key.
    #[instrument(skip(self))]
    pub async fn fetch_spreadsheet(&self, url: &str) -> MapResult<Arc<Value>> {
        let (key, export_url) =
            spreadsheet_export(url).ok_or_else(|| MapError::UnknownDataSource(url.to_string()))?;
        let cache_key = CacheKey::new(SourceKind::Spreadsheet, key);
        self.cache
            .fetch(&cache_key, || async {
                let text = self.fetcher.get_text(&export_url).await?;
                rows_from_csv(&text)
            })
            .await
    }

    /// Attribute rows for a layer's `data` URL, indexed by `id`.
    pub async fn fetch_rows(&self, data: &str) -> MapResult<DataTable> {
        let payload = match DataSource::from_url(data) {
            DataSource::Spreadsheet { .. } => self.fetch_spreadsheet(data).await?,
            DataSource::Json(url) => self.fetch_json(&url).await?,
            DataSource::Unknown(url) => return Err(MapError::UnknownDataSource(url)),
        };
        let table = DataTable::from_json(&payload)?;
        info!(data, rows = table.len(), "Loaded attribute rows");
        Ok(table)
    }
}

impl std::fmt::Debug for SourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceClient")
            .field("gist_api", &self.gist_api)
            .finish_non_exhaustive()
    }
}
