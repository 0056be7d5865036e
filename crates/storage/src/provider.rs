//! Configuration providers selected from bootstrap parameters.

use map_common::{Configuration, MapError, MapResult, QueryArgs};
use serde_json::Value;
use tracing::{info, instrument};

use crate::sources::SourceClient;

/// Gist file holding the configuration.
pub const CONFIG_FILE: &str = "map.json";

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// A gist whose `map.json` file holds the configuration text.
    Gist(String),
    /// A URL serving the configuration document.
    Path(String),
}

impl Provider {
    /// Select a provider; `gist` takes precedence over `path`. Only the first
    /// value of a repeated parameter counts.
    pub fn from_args(args: &QueryArgs) -> MapResult<Self> {
        if let Some(id) = args.first("gist") {
            Ok(Provider::Gist(id.to_string()))
        } else if let Some(path) = args.first("path") {
            Ok(Provider::Path(path.to_string()))
        } else {
            Err(MapError::NoProvider)
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gist(_) => "gist",
            Provider::Path(_) => "path",
        }
    }

    #[instrument(skip(sources), fields(provider = self.name()))]
    pub async fn resolve(&self, sources: &SourceClient) -> MapResult<Configuration> {
        let config = match self {
            Provider::Gist(id) => {
                let payload = sources.fetch_gist(id).await?;
                config_from_gist(id, &payload)?
            }
            Provider::Path(url) => {
                let payload = sources.fetch_json(url).await?;
                Configuration::from_value(Value::clone(&payload))?
            }
        };
        info!(layers = config.layers.len(), "Configuration resolved");
        Ok(config)
    }
}

/// Extract the configuration from a gist API payload.
///
/// Accepts both the bare payload (`files`) and the JSONP envelope
/// (`data.files`).
pub fn config_from_gist(id: &str, payload: &Value) -> MapResult<Configuration> {
    let files = payload
        .get("files")
        .or_else(|| payload.get("data").and_then(|d| d.get("files")));

    let content = files
        .and_then(|f| f.get(CONFIG_FILE))
        .and_then(|f| f.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| MapError::GistFileMissing {
            gist: id.to_string(),
            file: CONFIG_FILE.to_string(),
        })?;

    Configuration::from_json(content).map_err(|e| match e {
        MapError::DataReadError(message) => {
            MapError::InvalidConfig(format!("{} in gist {}", message, id))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_utils::fixtures;

    fn args(pairs: &[(&str, &str)]) -> QueryArgs {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_gist_takes_precedence() {
        let provider = Provider::from_args(&args(&[("path", "http://x/map.json"), ("gist", "abc")]));
        assert_eq!(provider.unwrap(), Provider::Gist("abc".to_string()));
    }

    #[test]
    fn test_first_value_wins() {
        let provider = Provider::from_args(&args(&[("path", "one"), ("path", "two")]));
        assert_eq!(provider.unwrap(), Provider::Path("one".to_string()));
    }

    #[test]
    fn test_no_provider() {
        let err = Provider::from_args(&args(&[("devel", "")])).unwrap_err();
        assert!(matches!(err, MapError::NoProvider));
    }

    #[test]
    fn test_config_from_bare_and_wrapped_gist() {
        let payload = fixtures::gist_payload(&fixtures::config());
        let config = config_from_gist("g", &payload).unwrap();
        assert_eq!(config.layers.len(), 2);

        let wrapped = json!({"meta": {"status": 200}, "data": payload});
        let config = config_from_gist("g", &wrapped).unwrap();
        assert_eq!(config.raw(), &fixtures::config());
    }

    #[test]
    fn test_gist_without_map_file() {
        let payload = json!({"files": {"other.json": {"content": "{}"}}});
        let err = config_from_gist("g", &payload).unwrap_err();
        assert!(matches!(err, MapError::GistFileMissing { .. }));
    }

    #[test]
    fn test_gist_with_broken_config() {
        let payload = json!({"files": {"map.json": {"content": "{\"layers\": ["}}});
        let err = config_from_gist("g", &payload).unwrap_err();
        assert_eq!(err.code(), "InvalidConfig");
    }
}
