//! Capture data model: immutable entries and the mock that owns them.

use crate::canonical::{HeaderMap, QueryMap};
use crate::error::CaptureError;
use crate::matching::session::SessionCursors;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How incoming requests are matched against a mock's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Stateless best-match per endpoint.
    Endpoint,
    /// Stateful forward-only replay per client session.
    Sequence,
}

/// Which retained response body an entry serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMode {
    Scrubbed,
    Original,
}

/// One normalized request/response pair from a capture.
///
/// Entries are immutable once parsed and freely shared for concurrent
/// reads; every match-relevant form is precomputed at parse time.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: String,
    /// Capture-order index; unique and strictly increasing within one
    /// capture, also the sequence-mode scan position.
    pub order_idx: usize,
    /// Upper-cased HTTP method.
    pub method: String,
    /// Original absolute request URL.
    pub url: String,
    pub path: String,
    /// Normalized query multi-map.
    pub query: QueryMap,
    /// Canonical percent-encoded rendering of `query`.
    pub query_canonical: String,
    /// `query` with volatile cache-busting keys removed.
    pub query_relaxed: QueryMap,
    /// Fingerprint over the allow-listed request headers.
    pub header_fp: String,
    /// Scrubbed request headers.
    pub req_headers: HeaderMap,
    /// SHA-256 of the scrubbed request body, when small enough to hash.
    pub req_body_hash: Option<String>,
    /// Raw captured request body; never served unless explicitly asked for.
    pub req_body_original: Option<Bytes>,
    pub req_body_scrubbed: Option<Bytes>,
    /// Captured response status.
    pub status: u16,
    /// Scrubbed response headers.
    pub resp_headers: HeaderMap,
    /// Raw captured response body; never served unless explicitly asked for.
    pub resp_body_original: Option<Bytes>,
    pub resp_body_scrubbed: Option<Bytes>,
    pub content_type: Option<String>,
    /// Captured wait timing in milliseconds, when positive.
    pub wait_ms: Option<u64>,
}

/// One imported capture plus its runtime configuration.
///
/// Created atomically from a successful parse; a failed parse produces no
/// mock. The entry list is fixed at creation. Configuration fields change
/// only through explicit updates, and session cursors only advance during
/// sequence-mode replay; the caller serializes both per mock.
#[derive(Debug)]
pub struct Mock {
    pub id: String,
    pub mode: MatchMode,
    pub body_mode: BodyMode,
    pub simulate_delay: bool,
    pub created_at: DateTime<Utc>,
    entries: Vec<Entry>,
    /// Per-session scan cursors; sequence mode only.
    pub sessions: SessionCursors,
}

impl Mock {
    /// Parse a capture document and build a mock from it, atomically.
    pub fn from_capture(bytes: &[u8]) -> Result<Self, CaptureError> {
        Ok(Self::new(super::har::parse_capture(bytes)?))
    }

    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            id: format!("mock_{}", short_id()),
            mode: MatchMode::Endpoint,
            body_mode: BodyMode::Scrubbed,
            simulate_delay: false,
            created_at: Utc::now(),
            entries,
            sessions: SessionCursors::new(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

/// Short random identifier suffix for mocks and suites.
pub(crate) fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
pub(crate) fn entry_fixture(order_idx: usize, method: &str, path: &str) -> Entry {
    Entry {
        id: format!("e_{order_idx}"),
        order_idx,
        method: method.to_uppercase(),
        url: format!("https://example.test{path}"),
        path: path.to_string(),
        query: QueryMap::new(),
        query_canonical: String::new(),
        query_relaxed: QueryMap::new(),
        header_fp: String::new(),
        req_headers: HeaderMap::new(),
        req_body_hash: None,
        req_body_original: None,
        req_body_scrubbed: None,
        status: 200,
        resp_headers: HeaderMap::new(),
        resp_body_original: None,
        resp_body_scrubbed: None,
        content_type: None,
        wait_ms: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_defaults() {
        let mock = Mock::new(vec![entry_fixture(0, "GET", "/a")]);
        assert!(mock.id.starts_with("mock_"));
        assert_eq!(mock.mode, MatchMode::Endpoint);
        assert_eq!(mock.body_mode, BodyMode::Scrubbed);
        assert!(!mock.simulate_delay);
        assert_eq!(mock.entries().len(), 1);
        assert!(mock.entry("e_0").is_some());
        assert!(mock.entry("e_9").is_none());
    }

    #[test]
    fn test_short_id_shape() {
        let a = short_id();
        let b = short_id();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&MatchMode::Sequence).unwrap(),
            "\"sequence\""
        );
        assert_eq!(
            serde_json::to_string(&BodyMode::Original).unwrap(),
            "\"original\""
        );
    }
}
