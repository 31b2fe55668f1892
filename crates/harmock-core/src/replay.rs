//! Replay response shaping and cooperative delay simulation.
//!
//! The serving layer hands a matched entry back here to get the response
//! it should actually write: scrubbed headers, the configured body, and
//! any status coercion applied.

use crate::canonical::HeaderMap;
use crate::capture::types::{BodyMode, Entry, Mock};
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;

/// Header exposing the captured status when a 304 is served as 200.
pub const ORIGINAL_STATUS_HEADER: &str = "x-har-original-status";

/// A fully shaped response, ready for the serving layer to write.
#[derive(Debug, Clone)]
pub struct ReplayResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Shape an entry into the response the serving layer should write.
///
/// Served bodies are not compressed, so any captured `content-encoding`
/// is dropped along with `set-cookie`. A captured 304 that retained a
/// body is served as 200 so the body is actually delivered, with the
/// captured status exposed in [`ORIGINAL_STATUS_HEADER`].
pub fn build_replay(mock: &Mock, entry: &Entry) -> ReplayResponse {
    let mut headers = entry.resp_headers.clone();
    headers.remove("set-cookie");
    headers.remove("content-encoding");
    if let Some(content_type) = &entry.content_type {
        headers.insert("content-type".to_string(), content_type.clone());
    }

    let scrubbed = entry.resp_body_scrubbed.as_ref();
    let original = entry.resp_body_original.as_ref();
    let body = match mock.body_mode {
        BodyMode::Original => original.or(scrubbed),
        BodyMode::Scrubbed => scrubbed,
    }
    .cloned();

    let has_body = original.is_some_and(|b| !b.is_empty())
        || scrubbed.is_some_and(|b| !b.is_empty());
    let mut status = entry.status;
    if status == 304 && has_body {
        headers.insert(
            ORIGINAL_STATUS_HEADER.to_string(),
            entry.status.to_string(),
        );
        status = 200;
    }

    ReplayResponse {
        status,
        headers,
        body,
    }
}

/// Sleep for the entry's captured wait when delay simulation is on.
///
/// Cooperative and non-blocking; other in-flight requests are unaffected.
/// There is no cancellation contract beyond the caller dropping the
/// future. The wait is bounded by the captured timing value.
pub async fn simulate_delay(mock: &Mock, entry: &Entry) {
    if !mock.simulate_delay {
        return;
    }
    if let Some(wait_ms) = entry.wait_ms {
        debug!(entry = %entry.id, wait_ms, "simulating captured latency");
        tokio::time::sleep(Duration::from_millis(wait_ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::entry_fixture;

    fn mock_with(entry: Entry) -> Mock {
        Mock::new(vec![entry])
    }

    #[test]
    fn test_build_replay_scrubs_serving_headers() {
        let mut entry = entry_fixture(0, "GET", "/x");
        entry
            .resp_headers
            .insert("content-encoding".into(), "gzip".into());
        entry.resp_headers.insert("etag".into(), "\"abc\"".into());
        entry.content_type = Some("application/json".into());
        entry.resp_body_scrubbed = Some(Bytes::from("{}"));

        let mock = mock_with(entry.clone());
        let response = build_replay(&mock, &entry);
        assert_eq!(response.status, 200);
        assert!(!response.headers.contains_key("content-encoding"));
        assert_eq!(response.headers.get("etag").unwrap(), "\"abc\"");
        assert_eq!(
            response.headers.get("content-type").unwrap(),
            "application/json"
        );
        assert_eq!(response.body.as_deref(), Some(b"{}".as_slice()));
    }

    #[test]
    fn test_build_replay_coerces_304_with_body() {
        let mut entry = entry_fixture(0, "GET", "/cached");
        entry.status = 304;
        entry.resp_body_scrubbed = Some(Bytes::from("cached"));
        let mock = mock_with(entry.clone());

        let response = build_replay(&mock, &entry);
        assert_eq!(response.status, 200);
        assert_eq!(
            response.headers.get(ORIGINAL_STATUS_HEADER).unwrap(),
            "304"
        );

        // a bodyless 304 stays a 304
        let mut bare = entry_fixture(1, "GET", "/cached");
        bare.status = 304;
        let mock = mock_with(bare.clone());
        let response = build_replay(&mock, &bare);
        assert_eq!(response.status, 304);
        assert!(!response.headers.contains_key(ORIGINAL_STATUS_HEADER));
    }

    #[test]
    fn test_build_replay_body_mode() {
        let mut entry = entry_fixture(0, "GET", "/x");
        entry.resp_body_original = Some(Bytes::from("original"));
        entry.resp_body_scrubbed = Some(Bytes::from("scrubbed"));

        let mut mock = mock_with(entry.clone());
        assert_eq!(
            build_replay(&mock, &entry).body.as_deref(),
            Some(b"scrubbed".as_slice())
        );
        mock.body_mode = BodyMode::Original;
        assert_eq!(
            build_replay(&mock, &entry).body.as_deref(),
            Some(b"original".as_slice())
        );

        // original mode falls back to scrubbed when nothing was retained
        let mut fallback = entry_fixture(1, "GET", "/x");
        fallback.resp_body_scrubbed = Some(Bytes::from("scrubbed"));
        let mut mock = mock_with(fallback.clone());
        mock.body_mode = BodyMode::Original;
        assert_eq!(
            build_replay(&mock, &fallback).body.as_deref(),
            Some(b"scrubbed".as_slice())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_delay_honors_captured_wait() {
        let mut entry = entry_fixture(0, "GET", "/slow");
        entry.wait_ms = Some(250);
        let mut mock = mock_with(entry.clone());
        mock.simulate_delay = true;

        let start = tokio::time::Instant::now();
        simulate_delay(&mock, &entry).await;
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_delay_disabled_is_immediate() {
        let mut entry = entry_fixture(0, "GET", "/slow");
        entry.wait_ms = Some(250);
        let mock = mock_with(entry.clone());

        let start = tokio::time::Instant::now();
        simulate_delay(&mock, &entry).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
