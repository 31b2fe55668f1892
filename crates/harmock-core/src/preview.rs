//! Read-side projections over entries: endpoint summaries, bounded body
//! previews, and example curl invocations for the inspection surface.

use crate::capture::types::Entry;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use std::collections::HashMap;

/// Preview bodies are cut off at 64 KiB.
const PREVIEW_LIMIT: usize = 64 * 1024;

/// Per-endpoint aggregate: `METHOD path` with its status spread.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSummary {
    pub method: String,
    pub path: String,
    pub count: usize,
    pub min_status: u16,
    pub avg_status: u16,
    pub max_status: u16,
}

/// Group entries by method+path, in first-seen capture order.
pub fn summarize_endpoints(entries: &[Entry]) -> Vec<EndpointSummary> {
    let mut order: Vec<(String, String, Vec<u16>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        let key = format!("{} {}", entry.method, entry.path);
        match index.get(&key) {
            Some(&slot) => order[slot].2.push(entry.status),
            None => {
                index.insert(key, order.len());
                order.push((entry.method.clone(), entry.path.clone(), vec![entry.status]));
            }
        }
    }
    order
        .into_iter()
        .map(|(method, path, statuses)| {
            let min_status = statuses.iter().copied().min().unwrap_or(0);
            let max_status = statuses.iter().copied().max().unwrap_or(0);
            let avg = statuses.iter().map(|s| u32::from(*s)).sum::<u32>() as f64
                / statuses.len() as f64;
            EndpointSummary {
                method,
                path,
                count: statuses.len(),
                min_status,
                avg_status: avg.round() as u16,
                max_status,
            }
        })
        .collect()
}

/// Bounded preview of a stored body.
///
/// JSON-ish bodies preview as text, everything else as base64, both cut
/// at the preview ceiling with the truncation flagged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyPreview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
}

pub fn body_preview(body: &[u8], content_type: Option<&str>) -> BodyPreview {
    let is_json = content_type
        .unwrap_or("")
        .to_lowercase()
        .contains("application/json");
    let truncated = body.len() > PREVIEW_LIMIT;
    let slice = if truncated {
        &body[..PREVIEW_LIMIT]
    } else {
        body
    };
    BodyPreview {
        content_type: content_type.map(str::to_string),
        size: body.len(),
        truncated,
        text: is_json.then(|| String::from_utf8_lossy(slice).into_owned()),
        base64: (!is_json).then(|| BASE64.encode(slice)),
    }
}

/// Copy-paste curl line replaying an entry against a mock mount point.
pub fn example_curl(mock_id: &str, entry: &Entry) -> String {
    let query = if entry.query_canonical.is_empty() {
        String::new()
    } else {
        format!("?{}", entry.query_canonical)
    };
    let mut cmd = format!(
        "curl -i -X {} 'http://localhost:3000/m/{}{}{}'",
        entry.method, mock_id, entry.path, query
    );
    if let Some(content_type) = entry.req_headers.get("content-type") {
        cmd.push_str(&format!(" \\\n  -H 'Content-Type: {content_type}'"));
    }
    if let Some(body) = &entry.req_body_scrubbed {
        let text = String::from_utf8_lossy(body).replace('\'', "'\\''");
        cmd.push_str(&format!(" \\\n  --data '{text}'"));
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::entry_fixture;
    use bytes::Bytes;

    #[test]
    fn test_summarize_endpoints_groups_and_orders() {
        let mut a0 = entry_fixture(0, "GET", "/a");
        a0.status = 200;
        let mut b = entry_fixture(1, "POST", "/b");
        b.status = 201;
        let mut a2 = entry_fixture(2, "GET", "/a");
        a2.status = 404;

        let summaries = summarize_endpoints(&[a0, b, a2]);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].path, "/a");
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].min_status, 200);
        assert_eq!(summaries[0].avg_status, 302);
        assert_eq!(summaries[0].max_status, 404);
        assert_eq!(summaries[1].path, "/b");
        assert_eq!(summaries[1].count, 1);
    }

    #[test]
    fn test_body_preview_json_vs_binary() {
        let json = body_preview(br#"{"a":1}"#, Some("application/json"));
        assert_eq!(json.text.as_deref(), Some(r#"{"a":1}"#));
        assert!(json.base64.is_none());
        assert!(!json.truncated);

        let binary = body_preview(b"\x00\x01", Some("application/octet-stream"));
        assert!(binary.text.is_none());
        assert_eq!(binary.base64.as_deref(), Some("AAE="));
    }

    #[test]
    fn test_body_preview_truncates() {
        let big = vec![b'x'; PREVIEW_LIMIT + 1];
        let preview = body_preview(&big, Some("application/json"));
        assert!(preview.truncated);
        assert_eq!(preview.size, PREVIEW_LIMIT + 1);
        assert_eq!(preview.text.unwrap().len(), PREVIEW_LIMIT);
    }

    #[test]
    fn test_example_curl() {
        let mut entry = entry_fixture(0, "POST", "/users");
        entry.query_canonical = "a=1".into();
        entry
            .req_headers
            .insert("content-type".into(), "application/json".into());
        entry.req_body_scrubbed = Some(Bytes::from(r#"{"name":"o'hara"}"#));

        let cmd = example_curl("mock_1", &entry);
        assert!(cmd.starts_with("curl -i -X POST 'http://localhost:3000/m/mock_1/users?a=1'"));
        assert!(cmd.contains("-H 'Content-Type: application/json'"));
        assert!(cmd.contains(r#"--data '{"name":"o'\''hara"}'"#));
    }
}
