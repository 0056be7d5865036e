//! Error types for the gistmap crates.

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for configuration, data and rendering operations.
#[derive(Debug, Error)]
pub enum MapError {
    // === Bootstrap Errors ===
    #[error("Invalid query string: {0}")]
    InvalidQueryString(String),

    #[error("No provider matched bootstrap parameters")]
    NoProvider,

    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid layer {index}: {message}")]
    InvalidLayer { index: usize, message: String },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Gist {gist} has no file named '{file}'")]
    GistFileMissing { gist: String, file: String },

    // === Data Errors ===
    #[error("Unknown data source: {0}")]
    UnknownDataSource(String),

    #[error("Unrecognized feature document type: {0}")]
    UnrecognizedDocument(String),

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Failed to read data: {0}")]
    DataReadError(String),

    // === Transport Errors ===
    #[error("Fetch failed for {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("Request timeout")]
    Timeout,
}

impl MapError {
    /// Short machine-readable code used in diagnostics and HTTP responses.
    pub fn code(&self) -> &'static str {
        match self {
            MapError::InvalidQueryString(_) => "InvalidQueryString",
            MapError::NoProvider => "NoProvider",
            MapError::InvalidConfig(_) | MapError::InvalidLayer { .. } => "InvalidConfig",
            MapError::InvalidColor(_) => "InvalidColor",
            MapError::GistFileMissing { .. } => "GistFileMissing",
            MapError::UnknownDataSource(_) => "UnknownDataSource",
            MapError::UnrecognizedDocument(_) | MapError::InvalidTopology(_) => {
                "UnrecognizedDocument"
            }
            MapError::DataReadError(_) => "DataReadError",
            MapError::FetchFailed { .. } | MapError::Timeout => "FetchFailed",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            MapError::InvalidQueryString(_)
            | MapError::InvalidConfig(_)
            | MapError::InvalidLayer { .. }
            | MapError::InvalidColor(_) => 400,

            MapError::NoProvider | MapError::GistFileMissing { .. } => 404,

            MapError::FetchFailed { .. } => 502,
            MapError::Timeout => 504,

            _ => 500,
        }
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::DataReadError(format!("JSON error: {}", err))
    }
}
