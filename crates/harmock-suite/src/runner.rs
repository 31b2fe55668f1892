//! Sequential suite execution and assertion evaluation.

use crate::report::{ItemResult, Report};
use harmock_core::canonical::canonical_query_string;
use harmock_core::suite::{Suite, SuiteAssertion, SuiteItem};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use serde_json_path::JsonPath;
use serde_json_path::{NormalizedPath, PathElement};
use std::fmt::Write as _;
use tracing::{debug, info};

/// Sentinel written over ignored nodes in failure-report bodies.
pub const IGNORED: &str = "__IGNORED__";

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid target url {0:?}")]
    InvalidTarget(String),
    #[error("failed to build http client: {0}")]
    Client(reqwest::Error),
}

/// Replay every suite item, in list order, against `target`.
///
/// Items run strictly sequentially: sequence-mode targets are
/// order-sensitive, and interleaving would make the replay
/// nondeterministic. One failing item never stops the rest; transport
/// errors become that item's failure.
pub async fn run_suite(suite: &Suite, target: &str) -> Result<Report, RunError> {
    let base = Url::parse(target).map_err(|_| RunError::InvalidTarget(target.to_string()))?;
    let client = Client::builder().build().map_err(RunError::Client)?;
    let mut results = Vec::with_capacity(suite.items.len());
    for item in &suite.items {
        let result = run_item(&client, &base, item).await;
        info!(name = %result.name, ok = result.ok, "suite item finished");
        results.push(result);
    }
    Ok(Report::new(&suite.name, results))
}

async fn run_item(client: &Client, base: &Url, item: &SuiteItem) -> ItemResult {
    let name = format!("{} {}", item.method, item.path);

    let mut path_and_query = item.path.clone();
    let query_string = canonical_query_string(&item.query);
    if !query_string.is_empty() {
        path_and_query.push('?');
        path_and_query.push_str(&query_string);
    }
    let url = match base.join(&path_and_query) {
        Ok(url) => url,
        Err(err) => return ItemResult::failed(name, format!("Invalid request url: {err}\n")),
    };
    let method = match Method::from_bytes(item.method.as_bytes()) {
        Ok(method) => method,
        Err(_) => return ItemResult::failed(name, format!("Invalid method {}\n", item.method)),
    };

    let mut request = client.request(method, url);
    if item.headers.is_empty() {
        request = request.header("content-type", "application/json");
    } else {
        for (header, value) in &item.headers {
            request = request.header(header, value);
        }
    }
    if let Some(body) = &item.body {
        match serde_json::to_vec(body) {
            Ok(encoded) => request = request.body(encoded),
            Err(err) => {
                return ItemResult::failed(name, format!("Failed to encode body: {err}\n"))
            }
        }
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => return ItemResult::failed(name, format!("Request failed: {err}\n")),
    };
    let status = response.status().as_u16();
    let text = match response.text().await {
        Ok(text) => text,
        Err(err) => {
            return ItemResult::failed(name, format!("Failed to read response body: {err}\n"))
        }
    };
    let body: Value =
        serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.clone()));
    debug!(name = %name, status, "response received");

    let mut ok = true;
    let mut message = String::new();
    if status != item.expect_status {
        ok = false;
        let _ = writeln!(message, "Status {} != {}", status, item.expect_status);
    }
    for assertion in &item.assertions {
        if let Some(line) = evaluate_assertion(assertion, &body) {
            ok = false;
            let _ = writeln!(message, "{line}");
        }
    }
    if !ok && body.is_object() {
        let masked = mask_ignored(&body, &item.ignore_paths);
        let rendered = serde_json::to_string_pretty(&masked).unwrap_or_default();
        let _ = writeln!(message, "Body:\n{rendered}");
    }

    ItemResult {
        name,
        ok,
        message: (!ok).then_some(message),
    }
}

/// Evaluate one assertion; returns a failure line when it does not hold.
///
/// An assertion passes iff at least one node matched the path and the
/// first match's serialized form equals the expected value's. Assertions
/// without a path or expected value are inert.
fn evaluate_assertion(assertion: &SuiteAssertion, body: &Value) -> Option<String> {
    let path = assertion.json_path.as_deref()?;
    let expected = assertion.equals.as_ref()?;
    let compiled = match JsonPath::parse(path) {
        Ok(compiled) => compiled,
        Err(err) => return Some(format!("Assert {path} invalid path: {err}")),
    };
    let nodes = compiled.query(body).all();
    let rendered_expected = render(expected);
    match nodes.first() {
        Some(actual) if render(actual) == rendered_expected => None,
        Some(actual) => Some(format!(
            "Assert {path} expected {rendered_expected} got {}",
            render(actual)
        )),
        None => Some(format!(
            "Assert {path} expected {rendered_expected} got undefined"
        )),
    }
}

fn render(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Clone `body` with every node matched by an ignore path replaced by the
/// sentinel, leaving the surrounding structure intact.
///
/// Lets failure diffs exclude known-volatile fields (timestamps, nonces)
/// without hiding the rest of the document. Unparsable ignore paths are
/// skipped.
pub fn mask_ignored(body: &Value, ignore_paths: &[String]) -> Value {
    if ignore_paths.is_empty() {
        return body.clone();
    }
    let mut masked = body.clone();
    for path in ignore_paths {
        let Ok(compiled) = JsonPath::parse(path) else {
            continue;
        };
        let snapshot = masked.clone();
        for location in compiled.query_located(&snapshot).locations() {
            set_at(&mut masked, location, &Value::String(IGNORED.to_string()));
        }
    }
    masked
}

/// Overwrite the node at a normalized path with `sentinel`.
fn set_at(root: &mut Value, location: &NormalizedPath, sentinel: &Value) {
    let elements: Vec<&PathElement> = location.iter().collect();
    if elements.is_empty() {
        *root = sentinel.clone();
        return;
    }
    let mut target = root;
    for (depth, element) in elements.iter().enumerate() {
        let last = depth + 1 == elements.len();
        match element {
            PathElement::Name(name) => {
                let Value::Object(map) = target else { return };
                if last {
                    map.insert(name.to_string(), sentinel.clone());
                    return;
                }
                let Some(next) = map.get_mut(*name) else {
                    return;
                };
                target = next;
            }
            PathElement::Index(index) => {
                let Value::Array(items) = target else { return };
                if last {
                    if let Some(slot) = items.get_mut(*index) {
                        *slot = sentinel.clone();
                    }
                    return;
                }
                let Some(next) = items.get_mut(*index) else {
                    return;
                };
                target = next;
            }
        }
    }
}
