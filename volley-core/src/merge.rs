//! Merge of the JSON request body with query string parameters.
//!
//! The JSON sub-document selected by the `jsonPath` parameter forms the base layer.
//! Query parameters then replace individual fields. Headers are the exception:
//! both sources contribute and the lists are concatenated, JSON first.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::json_path;

/// Query parameter holding the path expression into the JSON body
pub const JSON_PATH_PARAM: &str = "jsonPath";

/// Query parameter (repeatable) and JSON field carrying `Name: Value` headers
pub const HEADER_PARAM: &str = "H";

/// Canonical merged field holding the combined header list
pub const HEADERS_FIELD: &str = "headers";

/// Scalar run parameters a query string may override
pub const RUN_PARAMS: &[&str] = &[
    "url",
    "qps",
    "t",
    "n",
    "c",
    "timeout",
    "payload",
    "content-type",
    "labels",
    "p",
    "save",
    "async",
];

/// Query string parameters, each name mapping to its values in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    values: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from decoded `(name, value)` pairs, keeping repeated names in order
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (name, value) in pairs {
            params.push(name, value);
        }
        params
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    /// First value given for `name`
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value given for `name`
    pub fn all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The `jsonPath` expression, if one was supplied
    pub fn json_path(&self) -> Option<&str> {
        self.first(JSON_PATH_PARAM)
    }
}

/// Field mapping produced by [`merge`], consumed by [`crate::validate`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedConfig {
    fields: Map<String, Value>,
}

impl MergedConfig {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Combined header entries, JSON supplied ones first
    pub fn headers(&self) -> &[Value] {
        match self.fields.get(HEADERS_FIELD) {
            Some(Value::Array(entries)) => entries,
            _ => &[],
        }
    }
}

fn json_headers(value: Value) -> Vec<Value> {
    match value {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Merge a raw JSON body and query parameters into one field mapping.
///
/// An empty body contributes nothing. The path expression, when given, selects
/// which mapping inside the body is used as the base layer.
pub fn merge(body: &[u8], path: Option<&str>, query: &QueryParams) -> ResolveResult<MergedConfig> {
    let mut fields = Map::new();

    if !body.is_empty() {
        let document: Value =
            serde_json::from_slice(body).map_err(|e| ResolveError::malformed_json(&e))?;
        if !document.is_object() {
            return Err(ResolveError::MalformedJson {
                detail: format!("json body must be an object, got {}", json_kind(&document)),
            });
        }
        let selected = json_path::select_map(&document, path.unwrap_or_default())?;
        fields = selected.clone();
        debug!(
            "Selected {} field(s) from json body at path {:?}",
            fields.len(),
            path.unwrap_or_default()
        );
    }

    let mut headers = Vec::new();
    if let Some(value) = fields.remove(HEADERS_FIELD) {
        headers.extend(json_headers(value));
    }
    if let Some(value) = fields.remove(HEADER_PARAM) {
        headers.extend(json_headers(value));
    }

    for name in RUN_PARAMS {
        if let Some(value) = query.first(name) {
            if fields.contains_key(*name) {
                debug!("Query parameter {} overrides json body value", name);
            }
            fields.insert((*name).to_string(), Value::String(value.to_string()));
        }
    }

    headers.extend(
        query
            .all(HEADER_PARAM)
            .iter()
            .map(|h| Value::String(h.clone())),
    );
    if !headers.is_empty() {
        fields.insert(HEADERS_FIELD.to_string(), Value::Array(headers));
    }

    Ok(MergedConfig { fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_path::PathError;
    use serde_json::json;

    const BODY: &str = r#"{"metadata": {"url": "http://localhost/echo", "save": "on", "n": "200"}}"#;

    #[test]
    fn test_query_overrides_json() {
        let query = QueryParams::from_pairs([("jsonPath", ".metadata"), ("qps", "100"), ("n", "100")]);
        let merged = merge(BODY.as_bytes(), query.json_path(), &query).unwrap();

        assert_eq!(merged.get("n"), Some(&json!("100")));
        assert_eq!(merged.get("qps"), Some(&json!("100")));
        assert_eq!(merged.get("url"), Some(&json!("http://localhost/echo")));
        assert_eq!(merged.get("save"), Some(&json!("on")));
    }

    #[test]
    fn test_fields_absent_from_both_stay_absent() {
        let query = QueryParams::from_pairs([("url", "http://a/")]);
        let merged = merge(b"", None, &query).unwrap();
        assert!(!merged.contains("t"));
        assert!(!merged.contains(HEADERS_FIELD));
        assert_eq!(merged.fields().len(), 1);
    }

    #[test]
    fn test_headers_are_concatenated() {
        let body = r#"{"metadata": {"headers": ["Foo: Bar", "Blah: BlahV"]}}"#;
        let query = QueryParams::from_pairs([
            ("jsonPath", ".metadata"),
            ("H", "Third:HeaderV"),
            ("H", "Fourth: 4"),
        ]);
        let merged = merge(body.as_bytes(), query.json_path(), &query).unwrap();

        assert_eq!(
            merged.headers(),
            &[
                json!("Foo: Bar"),
                json!("Blah: BlahV"),
                json!("Third:HeaderV"),
                json!("Fourth: 4")
            ]
        );
    }

    #[test]
    fn test_single_json_header_string() {
        let body = r#"{"H": "X-One: 1"}"#;
        let merged = merge(body.as_bytes(), None, &QueryParams::new()).unwrap();
        assert_eq!(merged.headers(), &[json!("X-One: 1")]);
    }

    #[test]
    fn test_malformed_body() {
        let query = QueryParams::from_pairs([("jsonPath", ".metadata")]);
        let err = merge(br#"{"metadata": {"n":"#, query.json_path(), &query).unwrap_err();
        assert_eq!(err.detail(), "unexpected end of JSON input");
    }

    #[test]
    fn test_non_object_body_is_malformed() {
        for (body, kind) in [("[1,2]", "an array"), ("42", "a number"), ("\"url\"", "a string"), ("null", "null")] {
            let err = merge(body.as_bytes(), None, &QueryParams::new()).unwrap_err();
            assert!(matches!(err, ResolveError::MalformedJson { .. }), "{} gave {:?}", body, err);
            assert_eq!(err.detail(), format!("json body must be an object, got {}", kind));
        }

        let query = QueryParams::from_pairs([("jsonPath", ".metadata")]);
        let err = merge(b"[1,2]", query.json_path(), &query).unwrap_err();
        assert_eq!(err.classification(), "error parsing json body");
    }

    #[test]
    fn test_path_errors_propagate() {
        let query = QueryParams::from_pairs([("jsonPath", ".foo")]);
        let err = merge(BODY.as_bytes(), query.json_path(), &query).unwrap_err();
        assert_eq!(
            err,
            ResolveError::Path(PathError::NotFound { segment: "foo".into() })
        );

        let query = QueryParams::from_pairs([("jsonPath", ".metadata.url")]);
        let err = merge(BODY.as_bytes(), query.json_path(), &query).unwrap_err();
        assert_eq!(err.detail(), "\"url\" path is not a map");
    }

    #[test]
    fn test_path_without_body_is_ignored() {
        let query = QueryParams::from_pairs([("jsonPath", ".metadata"), ("url", "http://a/")]);
        let merged = merge(b"", query.json_path(), &query).unwrap();
        assert_eq!(merged.get("url"), Some(&json!("http://a/")));
    }

    #[test]
    fn test_first_value_wins_for_scalars() {
        let query = QueryParams::from_pairs([("n", "5"), ("n", "7")]);
        let merged = merge(b"", None, &query).unwrap();
        assert_eq!(merged.get("n"), Some(&json!("5")));
        assert_eq!(query.all("n").len(), 2);
    }
}
