//! Bootstrap query-string parsing.
//!
//! The viewer is bootstrapped from its URL query string (`gist=<id>`,
//! `path=<url>`, `devel`). Keys may repeat, so every key maps to the ordered
//! list of its values.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

use crate::{MapError, MapResult};

/// Decoded bootstrap parameters: key -> values in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs(HashMap<String, Vec<String>>);

impl QueryArgs {
    /// First value for a key.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    /// All values for a key.
    pub fn values(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> HashMap<String, Vec<String>> {
        self.0
    }
}

impl<K, V> FromIterator<(K, V)> for QueryArgs
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in iter {
            map.entry(key.into()).or_default().push(value.into());
        }
        Self(map)
    }
}

/// Parse a raw query string (without the leading `?`).
///
/// Pairs are split on `&` and each pair on its first `=`. Segments with an
/// empty key are dropped; a segment without `=` is a key with an empty value.
/// Both key and value are percent-decoded; `+` is left as is.
pub fn parse_query_string(query: &str) -> MapResult<QueryArgs> {
    let mut pairs = Vec::new();

    for segment in query.split('&') {
        let (raw_key, raw_value) = segment.split_once('=').unwrap_or((segment, ""));
        if raw_key.is_empty() {
            continue;
        }
        pairs.push((decode(raw_key)?, decode(raw_value)?));
    }

    Ok(pairs.into_iter().collect())
}

fn decode(component: &str) -> MapResult<String> {
    percent_decode_str(component)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|err| MapError::InvalidQueryString(format!("{}: {}", component, err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(query: &str) -> HashMap<String, Vec<String>> {
        parse_query_string(query).unwrap().into_inner()
    }

    fn expected(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_empty_string() {
        assert!(parsed("").is_empty());
    }

    #[test]
    fn test_simple_pair() {
        assert_eq!(parsed("a=b"), expected(&[("a", &["b"])]));
    }

    #[test]
    fn test_repeated_keys_keep_order() {
        assert_eq!(parsed("a=b&a=c&a=d"), expected(&[("a", &["b", "c", "d"])]));
    }

    #[test]
    fn test_decodes_keys_and_values() {
        assert_eq!(parsed("%20=%20"), expected(&[(" ", &[" "])]));
    }

    #[test]
    fn test_survives_broken_input() {
        assert!(parsed("&&&").is_empty());
        assert!(parsed("===").is_empty());
    }

    #[test]
    fn test_flag_without_value() {
        let args = parse_query_string("path=map.json&devel").unwrap();
        assert!(args.contains_key("devel"));
        assert_eq!(args.first("devel"), Some(""));
        assert_eq!(args.first("path"), Some("map.json"));
    }

    #[test]
    fn test_value_keeps_extra_equals() {
        assert_eq!(parsed("a=b=c"), expected(&[("a", &["b=c"])]));
    }

    #[test]
    fn test_encoded_url_value() {
        let args = parse_query_string("path=http%3A%2F%2Fexample.com%2Fmap.json").unwrap();
        assert_eq!(args.first("path"), Some("http://example.com/map.json"));
    }

    #[test]
    fn test_invalid_utf8_escape_is_an_error() {
        assert!(parse_query_string("a=%FF").is_err());
    }
}
