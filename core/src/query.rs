//! Query-string encoding with bracket-notation flattening.
//!
//! Nested objects become `key[nested]=...` and arrays become `key[]=...`,
//! recursively, before the pairs are form-urlencoded. Keys are emitted in
//! ascending order at every level so the same parameters always produce the
//! same URL.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Flatten one parameter into unescaped `(key, value)` pairs.
pub fn query_components(key: &str, value: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten(key.to_string(), value, &mut out);
    out
}

fn flatten(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (nested, v) in sorted(map) {
                flatten(format!("{key}[{nested}]"), v, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten(format!("{key}[]"), item, out);
            }
        }
        Value::String(s) => out.push((key, s.clone())),
        Value::Bool(b) => out.push((key, b.to_string())),
        Value::Number(n) => out.push((key, n.to_string())),
        Value::Null => out.push((key, String::new())),
    }
}

fn sorted(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Encode `params` as an escaped query string (without the leading `?`).
pub fn encode_query(params: &Map<String, Value>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in sorted(params) {
        for (k, v) in query_components(key, value) {
            serializer.append_pair(&k, &v);
        }
    }
    serializer.finish()
}

/// Append an encoded query to `url`, respecting an existing query string.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}
