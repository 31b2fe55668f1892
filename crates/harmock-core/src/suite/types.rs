//! Suite document wire types.
//!
//! The document shape is stable: runners and external tools exchange
//! suites as JSON, so every field rides the camelCase wire format.

use crate::canonical::{HeaderMap, QueryMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One field-level assertion over a response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteAssertion {
    /// JSONPath expression over the decoded response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    /// Expected value; the first matched node must deep-equal it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<serde_json::Value>,
}

/// Expected request/response contract for one selected entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteItem {
    pub entry_id: String,
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: QueryMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: HeaderMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    pub expect_status: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertions: Vec<SuiteAssertion>,
    /// JSONPaths masked out of failure-report bodies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_paths: Vec<String>,
}

/// A named, ordered regression suite derived from one mock's entries.
/// Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suite {
    pub id: String,
    pub name: String,
    pub mock_id: String,
    pub items: Vec<SuiteItem>,
    /// Build time, epoch milliseconds.
    pub created_at: i64,
}
