//! Per-connection session store.
//!
//! Each live connection owns at most one [`Session`] holding its most recent
//! search results. Entries are partitioned by [`ConnectionId`]; one
//! connection's handler never touches another connection's entry.

use std::collections::HashMap;

use newswire_core::{ConnectionId, SearchResult};
use parking_lot::Mutex;

/// Server-side memory for one connection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    /// Results of the last successful search, in provider order.
    pub results: Vec<SearchResult>,
}

/// Map of connection id to [`Session`].
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ConnectionId, Session>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a snapshot of the session for `id`, creating an empty one first
    /// if none exists.
    pub fn get_or_create(&self, id: &ConnectionId) -> Session {
        self.sessions.lock().entry(id.clone()).or_default().clone()
    }

    /// Replace (never merge) the stored results for `id`.
    ///
    /// Returns `false` without storing anything when the session is gone,
    /// so a late provider result cannot resurrect a closed connection.
    pub fn replace_results(&self, id: &ConnectionId, results: Vec<SearchResult>) -> bool {
        match self.sessions.lock().get_mut(id) {
            Some(session) => {
                session.results = results;
                true
            }
            None => false,
        }
    }

    /// Stored results for `id` (empty when none).
    pub fn results(&self, id: &ConnectionId) -> Vec<SearchResult> {
        self.sessions
            .lock()
            .get(id)
            .map(|s| s.results.clone())
            .unwrap_or_default()
    }

    /// Drop the session for `id`. Returns whether one existed; a second call
    /// is a no-op.
    pub fn remove(&self, id: &ConnectionId) -> bool {
        self.sessions.lock().remove(id).is_some()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no sessions exist.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
