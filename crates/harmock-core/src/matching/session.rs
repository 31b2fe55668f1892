//! Per-session scan cursors for sequence-mode replay.
//!
//! Each client session carries a cursor: the next entry index to resume
//! scanning from. Sessions are keyed by an opaque token the core mints
//! and the serving layer echoes back on subsequent requests.

use super::RequestKey;
use crate::capture::types::Entry;
use crate::error::MatchMiss;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Header the serving layer uses to hand the session token back and forth.
pub const SESSION_HEADER: &str = "x-mock-session";

/// Mint an opaque session token.
///
/// The token is a capability: random and unguessable. The core never
/// parses it or validates provenance; it is only ever a cursor-map key.
pub fn mint_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// Owned per-mock cursor map: session token → next scan offset.
///
/// The scan and the cursor advance happen under one write lock, so two
/// requests racing on the same token cannot both resume from a stale
/// offset. Scoped to one mock; never shared across mocks.
#[derive(Debug, Default)]
pub struct SessionCursors {
    cursors: RwLock<HashMap<String, usize>>,
}

impl SessionCursors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next scan offset for a session; fresh sessions start at 0.
    pub fn offset(&self, token: &str) -> usize {
        self.cursors.read().get(token).copied().unwrap_or(0)
    }

    /// Number of sessions that have advanced at least once.
    pub fn active_sessions(&self) -> usize {
        self.cursors.read().len()
    }
}

/// Stateful sequence-mode lookup: forward scan from the session cursor.
///
/// The first entry sharing method and path wins regardless of how
/// specifically its query or headers agree — within a scan every
/// method+path survivor classifies as at least path-only, and ranking
/// inside the window would break strict-order replay. The cursor advances
/// to one past the selected entry; reaching the end of the list without a
/// hit is an out-of-sequence miss.
pub fn match_sequence<'a>(
    entries: &'a [Entry],
    sessions: &SessionCursors,
    token: &str,
    key: &RequestKey,
) -> Result<&'a Entry, MatchMiss> {
    let mut cursors = sessions.cursors.write();
    let start = cursors.get(token).copied().unwrap_or(0);
    for (idx, entry) in entries.iter().enumerate().skip(start) {
        if entry.method == key.method && entry.path == key.path {
            cursors.insert(token.to_string(), idx + 1);
            debug!(token, from = start, matched = idx, "sequence advance");
            return Ok(entry);
        }
    }
    debug!(token, from = start, "sequence exhausted");
    Err(MatchMiss::OutOfSequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::HeaderMap;
    use crate::capture::types::entry_fixture;

    fn get_key(path: &str) -> RequestKey {
        RequestKey::new("GET", path, Vec::<(String, String)>::new(), &HeaderMap::new())
    }

    #[test]
    fn test_sequence_replays_in_capture_order() {
        let entries = vec![
            entry_fixture(0, "GET", "/x"),
            entry_fixture(1, "GET", "/x"),
            entry_fixture(2, "GET", "/x"),
        ];
        let sessions = SessionCursors::new();
        let token = mint_session_token();
        let key = get_key("/x");

        for expected in 0..3 {
            let entry = match_sequence(&entries, &sessions, &token, &key).unwrap();
            assert_eq!(entry.order_idx, expected);
        }
        assert!(matches!(
            match_sequence(&entries, &sessions, &token, &key),
            Err(MatchMiss::OutOfSequence)
        ));
    }

    #[test]
    fn test_sequence_skips_non_matching_entries() {
        let entries = vec![
            entry_fixture(0, "POST", "/login"),
            entry_fixture(1, "GET", "/status"),
            entry_fixture(2, "GET", "/status"),
        ];
        let sessions = SessionCursors::new();
        let entry = match_sequence(&entries, &sessions, "s1", &get_key("/status")).unwrap();
        assert_eq!(entry.order_idx, 1);
        assert_eq!(sessions.offset("s1"), 2);

        // the skipped login entry is now behind the cursor for this session
        assert!(matches!(
            match_sequence(
                &entries,
                &sessions,
                "s1",
                &RequestKey::new("POST", "/login", Vec::<(String, String)>::new(), &HeaderMap::new())
            ),
            Err(MatchMiss::OutOfSequence)
        ));
    }

    #[test]
    fn test_sessions_are_independent() {
        let entries = vec![entry_fixture(0, "GET", "/x"), entry_fixture(1, "GET", "/x")];
        let sessions = SessionCursors::new();
        let key = get_key("/x");

        assert_eq!(
            match_sequence(&entries, &sessions, "a", &key).unwrap().order_idx,
            0
        );
        assert_eq!(
            match_sequence(&entries, &sessions, "b", &key).unwrap().order_idx,
            0
        );
        assert_eq!(
            match_sequence(&entries, &sessions, "a", &key).unwrap().order_idx,
            1
        );
        assert_eq!(sessions.active_sessions(), 2);
    }

    #[test]
    fn test_minted_tokens_are_unique() {
        let a = mint_session_token();
        let b = mint_session_token();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }
}
