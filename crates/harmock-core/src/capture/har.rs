//! HAR capture document parsing.
//!
//! Converts a capture's ordered exchange list into [`Entry`] values,
//! wiring in canonicalization and scrubbing. Malformed documents fail the
//! whole import; there is no partial-capture recovery.

use super::types::Entry;
use crate::canonical::{
    canonical_query_string, hash_body, header_fingerprint, normalize_query, relaxed_query,
};
use crate::error::CaptureError;
use crate::redact::{drop_sensitive_headers, maybe_redact_body};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;
use url::Url;

// ============================================================================
// HAR wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct HarDocument {
    log: Option<HarLog>,
}

#[derive(Debug, Deserialize)]
struct HarLog {
    entries: Option<Vec<HarExchange>>,
}

#[derive(Debug, Deserialize)]
struct HarExchange {
    request: HarRequest,
    response: HarResponse,
    #[serde(default)]
    timings: Option<HarTimings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarRequest {
    method: String,
    url: String,
    #[serde(default)]
    headers: Vec<HarHeader>,
    #[serde(default)]
    post_data: Option<HarContent>,
}

#[derive(Debug, Deserialize)]
struct HarResponse {
    status: u16,
    #[serde(default)]
    headers: Vec<HarHeader>,
    #[serde(default)]
    content: Option<HarContent>,
}

#[derive(Debug, Deserialize)]
struct HarHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarContent {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HarTimings {
    #[serde(default)]
    wait: Option<f64>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a capture document into an ordered entry list.
///
/// Fails the whole import on invalid JSON, a missing `log.entries` list,
/// or an unparsable request URL.
pub fn parse_capture(bytes: &[u8]) -> Result<Vec<Entry>, CaptureError> {
    let document: HarDocument = serde_json::from_slice(bytes)?;
    let exchanges = document
        .log
        .and_then(|log| log.entries)
        .ok_or(CaptureError::MissingEntries)?;
    let entries = exchanges
        .into_iter()
        .enumerate()
        .map(|(idx, exchange)| build_entry(idx, exchange))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(entries = entries.len(), "parsed capture");
    Ok(entries)
}

fn build_entry(idx: usize, exchange: HarExchange) -> Result<Entry, CaptureError> {
    let HarExchange {
        request,
        response,
        timings,
    } = exchange;

    let url = Url::parse(&request.url).map_err(|source| CaptureError::InvalidUrl {
        index: idx,
        url: request.url.clone(),
        source,
    })?;
    let path = url.path().to_string();
    let query = normalize_query(url.query_pairs());
    let query_canonical = canonical_query_string(&query);
    let query_relaxed = relaxed_query(&query);

    // Content types come from the raw header lists; scrubbing happens after.
    let req_content_type = find_header(&request.headers, "content-type");
    let resp_content_type = find_header(&response.headers, "content-type")
        .or_else(|| content_mime_type(response.content.as_ref()));

    let req_headers = drop_sensitive_headers(
        request.headers.into_iter().map(|h| (h.name, h.value)),
    );
    let resp_headers = drop_sensitive_headers(
        response.headers.into_iter().map(|h| (h.name, h.value)),
    );

    let req_body_original = read_body(request.post_data.as_ref());
    let resp_body_original = read_body(response.content.as_ref());
    let req_body_scrubbed =
        maybe_redact_body(req_content_type.as_deref(), req_body_original.as_ref());
    let resp_body_scrubbed =
        maybe_redact_body(resp_content_type.as_deref(), resp_body_original.as_ref());

    Ok(Entry {
        id: format!("e_{idx}"),
        order_idx: idx,
        method: request.method.to_uppercase(),
        url: request.url,
        path,
        query_canonical,
        query_relaxed,
        header_fp: header_fingerprint(&req_headers),
        query,
        req_body_hash: req_body_scrubbed.as_deref().and_then(hash_body),
        req_headers,
        req_body_original,
        req_body_scrubbed,
        status: response.status,
        resp_headers,
        resp_body_original,
        resp_body_scrubbed,
        content_type: resp_content_type,
        wait_ms: timings
            .and_then(|t| t.wait)
            .filter(|wait| *wait > 0.0)
            .map(|wait| wait.floor() as u64),
    })
}

fn find_header(headers: &[HarHeader], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
}

fn content_mime_type(content: Option<&HarContent>) -> Option<String> {
    content.and_then(|c| c.mime_type.clone())
}

/// Decode a HAR body part; `base64` encoding decodes, anything else is
/// taken as UTF-8 text. Undecodable base64 falls back to the raw text
/// bytes rather than failing the import.
fn read_body(part: Option<&HarContent>) -> Option<Bytes> {
    let part = part?;
    let text = part.text.as_ref()?;
    if part.encoding.as_deref() == Some("base64") {
        if let Ok(decoded) = BASE64.decode(text.as_bytes()) {
            return Some(Bytes::from(decoded));
        }
    }
    Some(Bytes::from(text.clone().into_bytes()))
}
