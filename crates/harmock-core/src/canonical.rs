//! Canonical forms for captured requests.
//!
//! Everything a match decision reads is computed here once, at parse time:
//! the normalized query multi-map, its canonical string rendering, the
//! relaxed form with cache-busting keys removed, the request header
//! fingerprint, and the bounded body digest.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Normalized query multi-map: lower-cased keys, values sorted per key.
pub type QueryMap = BTreeMap<String, Vec<String>>;

/// Header map with lower-cased names and single string values.
pub type HeaderMap = BTreeMap<String, String>;

/// Cache-busting query keys excluded from match specificity.
const VOLATILE_KEYS: [&str; 4] = ["_t", "cache", "cachebust", "cb"];

/// Request headers that participate in the fingerprint, in emission order.
const FINGERPRINT_HEADERS: [&str; 3] = ["content-type", "accept", "authorization"];

/// Bodies above this size are never hashed.
const HASH_CEILING: usize = 1024 * 1024;

/// Normalize raw query pairs into a canonical multi-map.
///
/// Keys are lower-cased and each key's values sorted lexicographically;
/// the map itself keeps keys sorted. Idempotent: normalizing an already
/// normalized map is a no-op.
pub fn normalize_query<I, K, V>(pairs: I) -> QueryMap
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut out: QueryMap = BTreeMap::new();
    for (key, value) in pairs {
        out.entry(key.as_ref().to_lowercase())
            .or_default()
            .push(value.into());
    }
    for values in out.values_mut() {
        values.sort();
    }
    out
}

/// Render a normalized query as a percent-encoded `k=v&k=v` string.
///
/// Repeated keys repeat the pair; an empty map renders as the empty
/// string. A pure function of the normalized map, stable under any
/// reordering of the raw input.
pub fn canonical_query_string(query: &QueryMap) -> String {
    let mut parts = Vec::new();
    for (key, values) in query {
        for value in values {
            parts.push(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }
    }
    parts.join("&")
}

/// Drop the volatile cache-busting keys from a normalized query.
pub fn relaxed_query(query: &QueryMap) -> QueryMap {
    query
        .iter()
        .filter(|(key, _)| !VOLATILE_KEYS.contains(&key.as_str()))
        .map(|(key, values)| (key.clone(), values.clone()))
        .collect()
}

/// Compact fingerprint over the allow-listed request headers.
///
/// Emits `name:lowercased-value` for present headers only, in allow-list
/// order, `|`-joined. Headers outside the allow-list never contribute.
pub fn header_fingerprint(headers: &HeaderMap) -> String {
    let mut parts = Vec::new();
    for name in FINGERPRINT_HEADERS {
        if let Some(value) = headers.get(name) {
            parts.push(format!("{}:{}", name, value.to_lowercase()));
        }
    }
    parts.join("|")
}

/// SHA-256 hex digest of a body, or `None` above the 1 MiB ceiling.
pub fn hash_body(body: &[u8]) -> Option<String> {
    if body.len() > HASH_CEILING {
        return None;
    }
    Some(hex::encode(Sha256::digest(body)))
}
