//! Request parameters as seen by the query parsers.
//!
//! Table widgets send their state as query strings, some of them nested with
//! bracket notation (`queries[search]=foo&sorts[name]=1`). [`RequestParams`]
//! turns those into a nested, order-preserving JSON object so every parser
//! works against the same representation, whichever transport delivered it.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::convert::Infallible;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    params: Map<String, Value>,
}

impl RequestParams {
    #[must_use]
    pub fn new(params: Map<String, Value>) -> Self {
        Self { params }
    }

    /// Parse an url-encoded query string, nesting `a[b][c]=v` keys.
    ///
    /// A repeated key overwrites the earlier value. Empty brackets (`a[]=v`)
    /// collect values into an array.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = Map::new();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let path = split_key(&key);
            if path.is_empty() {
                continue;
            }
            insert_path(&mut params, &path, Value::String(value.into_owned()));
        }
        Self { params }
    }

    /// Build from a JSON object; any other JSON value yields empty params.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(params) => Self { params },
            _ => Self::default(),
        }
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Scalar value as text. Numbers and booleans are stringified.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).and_then(scalar_text)
    }

    /// Non-negative integer value, accepting numeric strings.
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(scalar_u64)
    }

    /// Signed integer value, accepting numeric strings.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(scalar_i64)
    }

    /// Boolean flag; `true`, `"true"`, `1` and `"1"` are truthy, anything else
    /// (including absence) is false.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).is_some_and(scalar_bool)
    }

    /// Nested object under `key`.
    #[must_use]
    pub fn get_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl From<Map<String, Value>> for RequestParams {
    fn from(params: Map<String, Value>) -> Self {
        Self::new(params)
    }
}

impl<S> FromRequestParts<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_query(parts.uri.query().unwrap_or_default()))
    }
}

pub(crate) fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) => Some(Cow::Borrowed(text.as_str())),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        Value::Bool(flag) => Some(Cow::Owned(flag.to_string())),
        _ => None,
    }
}

pub(crate) fn scalar_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn scalar_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn scalar_bool(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_i64() == Some(1),
        Value::String(text) => matches!(text.trim(), "true" | "1"),
        _ => false,
    }
}

/// `a[b][c]` -> `["a", "b", "c"]`, `a[]` -> `["a", ""]`
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    if open == 0 {
        return vec![key.to_string()];
    }

    let mut path = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            // unbalanced bracket: keep the remainder as a literal segment
            path.push(rest.to_string());
            return path;
        };
        path.push(stripped[..close].to_string());
        rest = &stripped[close + 1..];
    }
    path
}

fn insert_path(map: &mut Map<String, Value>, path: &[String], value: Value) {
    let (head, tail) = (&path[0], &path[1..]);

    if tail.is_empty() {
        map.insert(head.clone(), value);
        return;
    }

    if tail[0].is_empty() {
        let entry = map
            .entry(head.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
        if let Value::Array(items) = entry {
            items.push(value);
        }
        return;
    }

    let entry = map
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(child) = entry {
        insert_path(child, tail, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_query() {
        let params = RequestParams::from_query("sEcho=3&iDisplayStart=10&sSearch=foo%20bar");
        assert_eq!(params.get_str("sEcho").as_deref(), Some("3"));
        assert_eq!(params.get_u64("iDisplayStart"), Some(10));
        assert_eq!(params.get_str("sSearch").as_deref(), Some("foo bar"));
        assert!(!params.has("iDisplayLength"));
    }

    #[test]
    fn test_nested_query() {
        let params = RequestParams::from_query(
            "page=1&perPage=10&queries%5Bsearch%5D=foo&sorts[name]=-1&sorts[id]=1",
        );
        assert_eq!(params.get("queries"), Some(&json!({"search": "foo"})));

        let sorts: Vec<&str> = params
            .get_object("sorts")
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(sorts, vec!["name", "id"], "client order must be preserved");
    }

    #[test]
    fn test_array_brackets() {
        let params = RequestParams::from_query("ids[]=1&ids[]=2");
        assert_eq!(params.get("ids"), Some(&json!(["1", "2"])));
    }

    #[test]
    fn test_leading_question_mark_and_empty() {
        assert!(RequestParams::from_query("").is_empty());
        assert_eq!(RequestParams::from_query("?a=1").get_u64("a"), Some(1));
    }

    #[test]
    fn test_unbalanced_bracket_kept_literal() {
        let params = RequestParams::from_query("a[b=1");
        assert_eq!(params.get("a"), Some(&json!({"[b": "1"})));
    }

    #[test]
    fn test_scalar_coercion() {
        let params = RequestParams::from_json(json!({
            "n": 7,
            "s": " 8 ",
            "neg": "-1",
            "t": true,
            "one": "1",
            "zero": 0,
            "word": "yes",
        }));
        assert_eq!(params.get_u64("n"), Some(7));
        assert_eq!(params.get_u64("s"), Some(8));
        assert_eq!(params.get_u64("neg"), None);
        assert_eq!(params.get_i64("neg"), Some(-1));
        assert!(params.get_bool("t"));
        assert!(params.get_bool("one"));
        assert!(!params.get_bool("zero"));
        assert!(!params.get_bool("word"));
        assert!(!params.get_bool("missing"));
        assert_eq!(params.get_str("n").as_deref(), Some("7"));
    }

    #[test]
    fn test_non_object_json_is_empty() {
        assert!(RequestParams::from_json(json!([1, 2])).is_empty());
    }

    #[tokio::test]
    async fn test_extract_from_request() {
        let request = axum::http::Request::builder()
            .uri("/people?page=1&perPage=5")
            .body(())
            .unwrap();
        let (mut parts, ()) = request.into_parts();

        let params = RequestParams::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(params.get_u64("perPage"), Some(5));
    }
}
