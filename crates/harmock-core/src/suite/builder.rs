//! Suite building: project selected entries into expected contracts.

use super::types::{Suite, SuiteAssertion, SuiteItem};
use crate::canonical::HeaderMap;
use crate::capture::types::{short_id, Entry, Mock};
use chrono::Utc;
use tracing::debug;

/// Build a suite from a snapshot of the selected entries.
///
/// Selection preserves capture order; unknown ids are ignored. Shared
/// assertions and ignore paths are cloned onto every item. A request body
/// that fails to decode as JSON is omitted rather than failing the build.
pub fn build_suite(
    name: &str,
    mock: &Mock,
    selected_ids: &[String],
    shared_assertions: &[SuiteAssertion],
    ignore_paths: &[String],
) -> Suite {
    let items: Vec<SuiteItem> = mock
        .entries()
        .iter()
        .filter(|entry| selected_ids.iter().any(|id| id == &entry.id))
        .map(|entry| {
            let mut headers = HeaderMap::new();
            if let Some(content_type) = entry.req_headers.get("content-type") {
                headers.insert("content-type".to_string(), content_type.clone());
            }
            SuiteItem {
                entry_id: entry.id.clone(),
                method: entry.method.clone(),
                path: entry.path.clone(),
                query: entry.query.clone(),
                headers,
                body: decode_json_body(entry),
                expect_status: entry.status,
                assertions: shared_assertions.to_vec(),
                ignore_paths: ignore_paths.to_vec(),
            }
        })
        .collect();
    debug!(name, items = items.len(), "built suite");
    Suite {
        id: format!("suite_{}", short_id()),
        name: name.to_string(),
        mock_id: mock.id.clone(),
        items,
        created_at: Utc::now().timestamp_millis(),
    }
}

/// Best-effort JSON decode of the scrubbed request body.
fn decode_json_body(entry: &Entry) -> Option<serde_json::Value> {
    let content_type = entry.req_headers.get("content-type")?;
    if !content_type.to_lowercase().contains("application/json") {
        return None;
    }
    serde_json::from_slice(entry.req_body_scrubbed.as_ref()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::entry_fixture;
    use bytes::Bytes;
    use serde_json::json;

    fn mock_fixture() -> Mock {
        let mut post = entry_fixture(0, "POST", "/cart");
        post.req_headers
            .insert("content-type".into(), "application/json".into());
        post.req_body_scrubbed = Some(Bytes::from(r#"{"sku":"x"}"#));
        post.status = 201;

        let mut get = entry_fixture(1, "GET", "/cart");
        get.status = 200;

        let mut broken = entry_fixture(2, "POST", "/cart");
        broken
            .req_headers
            .insert("content-type".into(), "application/json".into());
        broken.req_body_scrubbed = Some(Bytes::from("{not json"));

        Mock::new(vec![post, get, broken])
    }

    #[test]
    fn test_build_suite_projects_selected_entries() {
        let mock = mock_fixture();
        let assertions = vec![SuiteAssertion {
            json_path: Some("$.ok".into()),
            equals: Some(json!(true)),
        }];
        let ignore = vec!["$.timestamp".to_string()];

        let suite = build_suite(
            "checkout",
            &mock,
            &["e_1".to_string(), "e_0".to_string()],
            &assertions,
            &ignore,
        );

        assert!(suite.id.starts_with("suite_"));
        assert_eq!(suite.mock_id, mock.id);
        assert_eq!(suite.items.len(), 2);
        // capture order wins over selection order
        assert_eq!(suite.items[0].entry_id, "e_0");
        assert_eq!(suite.items[1].entry_id, "e_1");

        let post = &suite.items[0];
        assert_eq!(post.expect_status, 201);
        assert_eq!(
            post.headers.get("content-type").unwrap(),
            "application/json"
        );
        assert_eq!(post.body, Some(json!({"sku": "x"})));
        assert_eq!(post.assertions, assertions);
        assert_eq!(post.ignore_paths, ignore);

        let get = &suite.items[1];
        assert!(get.headers.is_empty());
        assert!(get.body.is_none());
    }

    #[test]
    fn test_build_suite_body_decode_failure_omits_body() {
        let mock = mock_fixture();
        let suite = build_suite("broken", &mock, &["e_2".to_string()], &[], &[]);
        assert_eq!(suite.items.len(), 1);
        assert!(suite.items[0].body.is_none());
    }

    #[test]
    fn test_build_suite_ignores_unknown_ids() {
        let mock = mock_fixture();
        let suite = build_suite("empty", &mock, &["e_99".to_string()], &[], &[]);
        assert!(suite.items.is_empty());
    }
}
