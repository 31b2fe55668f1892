//! Match engine: tier classification and entry selection.
//!
//! Endpoint mode ranks every method+path survivor by specificity and
//! picks the best; sequence mode trades that ranking for strict
//! forward-only ordering per client session (see [`session`]).

pub mod session;

use crate::canonical::{
    canonical_query_string, header_fingerprint, normalize_query, relaxed_query, HeaderMap,
    QueryMap,
};
use crate::capture::types::Entry;
use crate::error::MatchMiss;
use tracing::debug;

/// Match specificity; lower ranks win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Canonical query string and header fingerprint both equal.
    Exact,
    /// The entry's relaxed query is a subset of the request's.
    Relaxed,
    /// Method+path agreement only; the guaranteed fallback.
    PathOnly,
}

/// Precomputed canonical forms of one incoming request.
#[derive(Debug, Clone)]
pub struct RequestKey {
    pub method: String,
    pub path: String,
    pub query_canonical: String,
    pub query_relaxed: QueryMap,
    pub header_fp: String,
}

impl RequestKey {
    /// Canonicalize the match-relevant parts of an incoming request.
    pub fn new<I, K, V>(method: &str, path: &str, query_pairs: I, headers: &HeaderMap) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let query = normalize_query(query_pairs);
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            query_canonical: canonical_query_string(&query),
            query_relaxed: relaxed_query(&query),
            header_fp: header_fingerprint(headers),
        }
    }
}

/// An entry paired with its tier for one incoming request; discarded
/// after selection.
#[derive(Debug, Clone, Copy)]
pub struct MatchCandidate<'a> {
    pub entry: &'a Entry,
    pub tier: Tier,
}

/// Classify how specifically an entry matches a request already known to
/// share its method and path.
///
/// Every survivor classifies as at least [`Tier::PathOnly`]: a captured
/// method+path always matches something. Tightening the fallback would
/// change observable miss behavior.
pub fn classify_tier(entry: &Entry, key: &RequestKey) -> Tier {
    if entry.query_canonical == key.query_canonical && entry.header_fp == key.header_fp {
        Tier::Exact
    } else if query_subset(&entry.query_relaxed, &key.query_relaxed) {
        Tier::Relaxed
    } else {
        Tier::PathOnly
    }
}

/// True when every key/value pair of `a` is present in `b`.
fn query_subset(a: &QueryMap, b: &QueryMap) -> bool {
    a.iter().all(|(key, values)| {
        let present = b.get(key).map(Vec::as_slice).unwrap_or(&[]);
        values.iter().all(|value| present.contains(value))
    })
}

/// Pick the winning candidate: lowest tier rank, ties broken by earliest
/// capture order.
pub fn choose_best_match<'a>(candidates: Vec<MatchCandidate<'a>>) -> Option<&'a Entry> {
    candidates
        .into_iter()
        .min_by_key(|c| (c.tier, c.entry.order_idx))
        .map(|c| c.entry)
}

/// Stateless endpoint-mode lookup.
///
/// Filters to method+path survivors, classifies each, and returns the
/// best. An empty survivor set is a lookup miss, not an error.
pub fn match_endpoint<'a>(entries: &'a [Entry], key: &RequestKey) -> Result<&'a Entry, MatchMiss> {
    let candidates: Vec<MatchCandidate<'a>> = entries
        .iter()
        .filter(|e| e.method == key.method && e.path == key.path)
        .map(|entry| MatchCandidate {
            entry,
            tier: classify_tier(entry, key),
        })
        .collect();
    debug!(
        method = %key.method,
        path = %key.path,
        candidates = candidates.len(),
        "endpoint lookup"
    );
    choose_best_match(candidates).ok_or(MatchMiss::NoMatch)
}
