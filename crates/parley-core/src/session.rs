//! Session store — per-session conversation logs held in process memory.
//!
//! Each session is a bounded, insertion-ordered list of [`Turn`]s. When a
//! session grows past its cap the oldest turns are dropped first. Sessions
//! live until [`SessionStore::clear`] or process exit; nothing is persisted.

use std::collections::{BTreeSet, VecDeque};

use dashmap::DashMap;

use crate::message::{Role, Turn};

/// Turns kept per session before the oldest are evicted.
pub const DEFAULT_MAX_TURNS: usize = 50;

/// Owns every session in the process.
///
/// Mutations of one session are mutually exclusive (the map locks per
/// shard), while unrelated sessions rarely contend. Create one per process
/// and share it behind an `Arc`; tests create their own.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, VecDeque<Turn>>,
    max_turns: usize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_max_turns(DEFAULT_MAX_TURNS)
    }

    /// Create a store with a custom per-session cap (minimum 1).
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_turns: max_turns.max(1),
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Turns for a session, oldest first. Unknown sessions are empty.
    pub fn get_history(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .get(session_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append one turn, creating the session if needed.
    pub fn append(&self, session_id: &str, role: Role, content: &str) {
        let mut turns = self.sessions.entry(session_id.to_string()).or_default();
        turns.push_back(Turn::new(role, content));
        Self::evict(&mut turns, self.max_turns);
    }

    /// Append a user turn and its reply under a single lock, so concurrent
    /// exchanges on the same session never interleave.
    pub fn append_exchange(&self, session_id: &str, user_text: &str, assistant_text: &str) {
        let mut turns = self.sessions.entry(session_id.to_string()).or_default();
        turns.push_back(Turn::user(user_text));
        turns.push_back(Turn::assistant(assistant_text));
        Self::evict(&mut turns, self.max_turns);
    }

    /// Drop a session entirely. Unknown sessions are a no-op.
    pub fn clear(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Snapshot of the known session identifiers.
    pub fn list_sessions(&self) -> BTreeSet<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn turn_count(&self, session_id: &str) -> usize {
        self.sessions.get(session_id).map(|t| t.len()).unwrap_or(0)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn evict(turns: &mut VecDeque<Turn>, max_turns: usize) {
        while turns.len() > max_turns {
            turns.pop_front();
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_session_is_empty() {
        let store = SessionStore::new();
        assert!(store.get_history("nobody").is_empty());
        assert_eq!(store.turn_count("nobody"), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let store = SessionStore::new();
        store.append("s1", Role::User, "one");
        store.append("s1", Role::Assistant, "two");
        store.append("s1", Role::User, "three");

        let history = store.get_history("s1");
        let contents: Vec<_> = history.iter().map(|t| t.content()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
        assert_eq!(history[1].role(), Role::Assistant);
    }

    #[test]
    fn test_cap_keeps_last_fifty() {
        let store = SessionStore::new();
        for i in 0..60 {
            store.append("s1", Role::User, &format!("msg {}", i));
        }

        let history = store.get_history("s1");
        assert_eq!(history.len(), DEFAULT_MAX_TURNS);
        assert_eq!(history.first().unwrap().content(), "msg 10");
        assert_eq!(history.last().unwrap().content(), "msg 59");
    }

    #[test]
    fn test_exchange_respects_cap() {
        let store = SessionStore::with_max_turns(3);
        store.append_exchange("s1", "a", "b");
        store.append_exchange("s1", "c", "d");

        let history = store.get_history("s1");
        assert_eq!(
            history,
            vec![Turn::assistant("b"), Turn::user("c"), Turn::assistant("d")]
        );
    }

    #[test]
    fn test_clear_removes_session() {
        let store = SessionStore::new();
        store.append_exchange("s1", "hi", "hello");
        store.append_exchange("s2", "hey", "yo");

        store.clear("s1");
        store.clear("never-existed");

        assert!(store.get_history("s1").is_empty());
        assert_eq!(store.turn_count("s2"), 2);
        assert_eq!(store.list_sessions(), BTreeSet::from(["s2".to_string()]));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        store.append("a", Role::User, "for a");
        store.append("b", Role::User, "for b");

        assert_eq!(store.get_history("a"), vec![Turn::user("for a")]);
        assert_eq!(store.get_history("b"), vec![Turn::user("for b")]);
        assert_eq!(store.len(), 2);
    }
}
