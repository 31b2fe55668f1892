//! Run reports and JUnit rendering.

use serde::Serialize;

/// Outcome of one suite item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    /// `METHOD path`, the per-item case name.
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ItemResult {
    pub(crate) fn failed(name: String, message: String) -> Self {
        Self {
            name,
            ok: false,
            message: Some(message),
        }
    }
}

/// Aggregated results for one suite run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub suite: String,
    pub total: usize,
    pub failures: usize,
    pub results: Vec<ItemResult>,
}

impl Report {
    pub fn new(suite: &str, results: Vec<ItemResult>) -> Self {
        let failures = results.iter().filter(|r| !r.ok).count();
        Self {
            suite: suite.to_string(),
            total: results.len(),
            failures,
            results,
        }
    }

    pub fn passed(&self) -> bool {
        self.failures == 0
    }

    /// Render as a JUnit `<testsuite>` document.
    pub fn to_junit(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!(
            "<testsuite name=\"{}\" tests=\"{}\" failures=\"{}\">",
            xml_escape(&self.suite),
            self.total,
            self.failures
        ));
        for result in &self.results {
            if result.ok {
                out.push_str(&format!("<testcase name=\"{}\"/>", xml_escape(&result.name)));
            } else {
                out.push_str(&format!(
                    "<testcase name=\"{}\"><failure><![CDATA[{}]]></failure></testcase>",
                    xml_escape(&result.name),
                    result.message.as_deref().unwrap_or("")
                ));
            }
        }
        out.push_str("</testsuite>");
        out
    }
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
