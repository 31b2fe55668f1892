//! Scrubbing of sensitive material from captured exchanges.
//!
//! Headers on a fixed deny-list are dropped outright; JSON bodies get a
//! recursive field-level pass that replaces sensitive values with a fixed
//! sentinel. Non-JSON bodies are never touched.

use crate::canonical::HeaderMap;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::btree_map::Entry as MapEntry;

/// Sentinel written over redacted JSON field values.
pub const REDACTED: &str = "REDACTED";

/// Headers never retained on parsed entries.
const SENSITIVE_HEADERS: [&str; 3] = ["cookie", "authorization", "set-cookie"];

/// Exact-match (case-insensitive) field names whose values are redacted.
static SENSITIVE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(password|token|email|phone|card|cvv|ssn)$").unwrap());

/// Drop sensitive headers and coerce the rest to single string values.
///
/// Names are lower-cased; repeated names are joined with `", "`.
pub fn drop_sensitive_headers<I>(headers: I) -> HeaderMap
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        let name = name.to_lowercase();
        if SENSITIVE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        match out.entry(name) {
            MapEntry::Occupied(mut slot) => {
                let joined = format!("{}, {}", slot.get(), value);
                slot.insert(joined);
            }
            MapEntry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
    out
}

/// Recursively redact sensitive fields in a JSON tree.
///
/// An object key matching the sensitive-field set has its whole value
/// replaced with [`REDACTED`], nested or not. Arrays and non-matching
/// object values recurse; scalars pass through. Capture bodies are always
/// tree-shaped, so the recursion terminates.
pub fn redact_json(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(redact_json).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, field)| {
                    if SENSITIVE_FIELD.is_match(&key) {
                        (key, Value::String(REDACTED.to_string()))
                    } else {
                        (key, redact_json(field))
                    }
                })
                .collect(),
        ),
        scalar => scalar,
    }
}

/// Redact a body when its declared content type is JSON.
///
/// Anything that is not declared JSON, or fails to parse as JSON, is
/// passed through byte-for-byte. Never fails, never drops data.
pub fn maybe_redact_body(content_type: Option<&str>, body: Option<&Bytes>) -> Option<Bytes> {
    let body = body?;
    let declared = content_type.unwrap_or("").to_lowercase();
    if !declared.contains("application/json") {
        return Some(body.clone());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(parsed) => match serde_json::to_vec(&redact_json(parsed)) {
            Ok(rendered) => Some(Bytes::from(rendered)),
            Err(_) => Some(body.clone()),
        },
        // not actually JSON, leave untouched
        Err(_) => Some(body.clone()),
    }
}
