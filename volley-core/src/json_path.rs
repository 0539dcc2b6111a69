//! Dotted path navigation over untyped JSON documents

use serde_json::{Map, Value};
use thiserror::Error;

/// Failure to walk a path expression through a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A segment names a key the current mapping does not have
    #[error("{segment:?} not found in json")]
    NotFound { segment: String },

    /// Traversal needs to continue through a value that is not a mapping
    #[error("{segment:?} path is not a map")]
    NotAMap { segment: String },
}

impl PathError {
    /// The path segment the error is about
    pub fn segment(&self) -> &str {
        match self {
            PathError::NotFound { segment } | PathError::NotAMap { segment } => segment,
        }
    }
}

fn segments(path: &str) -> Option<std::str::Split<'_, char>> {
    let path = path.strip_prefix('.').unwrap_or(path);
    if path.is_empty() {
        None
    } else {
        Some(path.split('.'))
    }
}

/// Return the value found at `path` inside `document`.
///
/// The path is a dot separated list of keys. A single leading dot is ignored and
/// an empty path selects the whole document.
pub fn navigate<'a>(document: &'a Value, path: &str) -> Result<&'a Value, PathError> {
    let Some(segments) = segments(path) else {
        return Ok(document);
    };

    let mut current = document;
    let mut reached_through: Option<&str> = None;
    for segment in segments {
        let map = match current {
            Value::Object(map) => map,
            _ => {
                return Err(match reached_through {
                    Some(previous) => PathError::NotAMap {
                        segment: previous.to_string(),
                    },
                    None => PathError::NotFound {
                        segment: segment.to_string(),
                    },
                })
            }
        };
        current = map.get(segment).ok_or_else(|| PathError::NotFound {
            segment: segment.to_string(),
        })?;
        reached_through = Some(segment);
    }

    Ok(current)
}

/// Like [`navigate`], but the selected value must itself be a mapping.
///
/// A leaf reached at the end of the path is reported as a type error naming the
/// last segment, since the caller wants to keep reading fields out of it.
pub fn select_map<'a>(document: &'a Value, path: &str) -> Result<&'a Map<String, Value>, PathError> {
    let selected = navigate(document, path)?;
    selected.as_object().ok_or_else(|| PathError::NotAMap {
        segment: segments(path)
            .and_then(|s| s.last())
            .unwrap_or_default()
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "metadata": {
                "url": "http://localhost:8080/echo",
                "n": "200",
                "nested": { "qps": 10 }
            },
            "list": [1, 2, 3]
        })
    }

    #[test]
    fn test_empty_path_selects_document() {
        let doc = sample();
        assert_eq!(navigate(&doc, "").unwrap(), &doc);
        assert_eq!(navigate(&doc, ".").unwrap(), &doc);
    }

    #[test]
    fn test_navigate_nested() {
        let doc = sample();
        assert_eq!(navigate(&doc, ".metadata.nested.qps").unwrap(), &json!(10));
        assert_eq!(navigate(&doc, "metadata.n").unwrap(), &json!("200"));
        assert_eq!(navigate(&doc, ".list").unwrap(), &json!([1, 2, 3]));
    }

    #[test]
    fn test_missing_segment() {
        let doc = sample();
        let err = navigate(&doc, ".foo").unwrap_err();
        assert_eq!(err.to_string(), "\"foo\" not found in json");

        let err = navigate(&doc, ".metadata.bar").unwrap_err();
        assert_eq!(err, PathError::NotFound { segment: "bar".into() });
    }

    #[test]
    fn test_traversal_through_leaf() {
        let doc = sample();
        let err = navigate(&doc, ".metadata.url.host").unwrap_err();
        assert_eq!(err.to_string(), "\"url\" path is not a map");
        assert_eq!(err.segment(), "url");
    }

    #[test]
    fn test_select_map_rejects_leaf() {
        let doc = sample();
        let err = select_map(&doc, ".metadata.url").unwrap_err();
        assert_eq!(err.to_string(), "\"url\" path is not a map");

        let map = select_map(&doc, ".metadata").unwrap();
        assert!(map.contains_key("url"));
    }

    #[test]
    fn test_select_map_on_non_object_document() {
        let doc = json!([1, 2]);
        assert_eq!(
            select_map(&doc, "").unwrap_err(),
            PathError::NotAMap { segment: String::new() }
        );
        assert_eq!(
            navigate(&doc, ".a").unwrap_err(),
            PathError::NotFound { segment: "a".into() }
        );
    }
}
