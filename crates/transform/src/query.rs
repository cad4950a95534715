//! Request target parsing

use std::collections::HashMap;

use url::Url;

use crate::error::{TransformError, TransformResult};

/// Base used to resolve origin-form targets such as `/t?a=1`
const ORIGIN_BASE: &str = "http://localhost";

/// Separator for repeated query values
pub const VALUE_SEPARATOR: &str = "+";

/// Parsed request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// Target text before any `?` or `#`
    pub path: String,

    /// Decoded query parameters grouped by key in first-seen order
    pub params: Vec<(String, Vec<String>)>,
}

impl RequestTarget {
    /// Parse an origin-form (`/path?query`) or absolute target
    pub fn parse(target: &str) -> TransformResult<Self> {
        let url = if target.starts_with('/') {
            Url::parse(ORIGIN_BASE).and_then(|base| base.join(target))
        } else {
            Url::parse(target)
        }
        .map_err(|e| TransformError::uri(target, e.to_string()))?;

        let path_end = target.find(['?', '#']).unwrap_or(target.len());
        let path = target[..path_end].to_string();

        let mut params: Vec<(String, Vec<String>)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (key, value) in url.query_pairs() {
            match positions.get(&*key) {
                Some(&i) => params[i].1.push(value.into_owned()),
                None => {
                    positions.insert(key.to_string(), params.len());
                    params.push((key.into_owned(), vec![value.into_owned()]));
                }
            }
        }

        Ok(Self { path, params })
    }

    /// Keys with their values joined by `+`
    pub fn joined(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.params
            .iter()
            .map(|(key, values)| (key.as_str(), values.join(VALUE_SEPARATOR)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_values_joined() {
        let target = RequestTarget::parse("/t?category=shoes&category=hats").unwrap();
        let joined: Vec<_> = target.joined().collect();

        assert_eq!(joined, vec![("category", "shoes+hats".to_string())]);
        assert_eq!(target.path, "/t");
    }

    #[test]
    fn test_first_seen_order() {
        let target = RequestTarget::parse("/t?b=1&a=2&b=3").unwrap();
        let keys: Vec<_> = target.params.iter().map(|(k, _)| k.as_str()).collect();

        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(target.params[0].1, vec!["1", "3"]);
    }

    #[test]
    fn test_values_are_decoded() {
        let target = RequestTarget::parse("/t?title=hello%20world&q=a+b&e=").unwrap();
        let joined: Vec<_> = target.joined().collect();

        assert_eq!(joined[0], ("title", "hello world".to_string()));
        assert_eq!(joined[1], ("q", "a b".to_string()));
        assert_eq!(joined[2], ("e", String::new()));
    }

    #[test]
    fn test_keys_keep_case() {
        let target = RequestTarget::parse("/t?Category=x").unwrap();
        assert_eq!(target.params[0].0, "Category");
    }

    #[test]
    fn test_absolute_target() {
        let target = RequestTarget::parse("https://api.example.com/v1/track?d=42#frag").unwrap();

        assert_eq!(target.path, "https://api.example.com/v1/track");
        assert_eq!(target.params, vec![("d".to_string(), vec!["42".to_string()])]);
    }

    #[test]
    fn test_no_query() {
        let target = RequestTarget::parse("/health").unwrap();
        assert_eq!(target.path, "/health");
        assert!(target.params.is_empty());
    }

    #[test]
    fn test_invalid_targets() {
        for bad in ["", "relative/path?a=1", "?a=1"] {
            let err = RequestTarget::parse(bad).unwrap_err();
            assert!(matches!(err, TransformError::UriError { .. }), "{bad:?}");
        }
    }
}
