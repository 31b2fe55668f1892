//! Error taxonomy for the capture/replay core.

use thiserror::Error;

/// Fatal capture-import failures.
///
/// A capture either imports completely or not at all; no partial entry
/// list is ever produced.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The document is not valid JSON.
    #[error("invalid capture document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parses but carries no `log.entries` list.
    #[error("capture document has no log.entries")]
    MissingEntries,

    /// An exchange's request URL could not be parsed.
    #[error("entry {index}: invalid request url {url:?}: {source}")]
    InvalidUrl {
        index: usize,
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Recoverable lookup misses from the match engine.
///
/// Misses are expected outcomes returned as values, never panics. The two
/// variants stay distinct so callers can tell "wrong request shape"
/// (`NoMatch`) from "replay exhausted" (`OutOfSequence`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchMiss {
    #[error("no entry matches the request")]
    NoMatch,
    #[error("session reached the end of the capture without a match")]
    OutOfSequence,
}
