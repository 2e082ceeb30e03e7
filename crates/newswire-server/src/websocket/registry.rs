//! Registry of live connections.
//!
//! The only structure shared across connection tasks. Backed by a
//! [`DashMap`] so inserts, removals, and fan-out iteration never take a
//! global lock.

use std::sync::Arc;

use dashmap::DashMap;
use newswire_core::ConnectionId;
use tokio::sync::mpsc;

use super::connection::ClientConnection;

/// Result of one broadcast fan-out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Recipients the payload was enqueued for.
    pub delivered: usize,
    /// Open recipients whose queue was full.
    pub dropped: usize,
}

/// All connections currently registered with the server.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<ClientConnection>>,
    max_send_queue: usize,
}

impl ConnectionRegistry {
    /// Create an empty registry; each connection gets a queue of
    /// `max_send_queue` frames.
    pub fn new(max_send_queue: usize) -> Self {
        Self {
            connections: DashMap::new(),
            max_send_queue: max_send_queue.max(1),
        }
    }

    /// Register a new open connection and return it with its outbound queue.
    pub fn register(&self) -> (Arc<ClientConnection>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(self.max_send_queue);
        let conn = Arc::new(ClientConnection::new(ConnectionId::new(), tx));
        let _ = self.connections.insert(conn.id().clone(), Arc::clone(&conn));
        (conn, rx)
    }

    /// Remove a connection and mark it closed.
    pub fn unregister(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        let (_, conn) = self.connections.remove(id)?;
        let _ = conn.begin_close();
        conn.mark_closed();
        Some(conn)
    }

    /// Look up a connection.
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.get(id).map(|c| Arc::clone(c.value()))
    }

    /// Number of registered connections.
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Enqueue `payload` for every open connection except `sender`.
    ///
    /// Never waits: a recipient with a full queue misses this payload.
    pub fn broadcast_from(&self, sender: &ConnectionId, payload: &Arc<String>) -> FanOut {
        let mut outcome = FanOut::default();
        for entry in &self.connections {
            let conn = entry.value();
            if conn.id() == sender || !conn.is_open() {
                continue;
            }
            if conn.try_deliver(Arc::clone(payload)) {
                outcome.delivered += 1;
            } else if conn.is_open() {
                outcome.dropped += 1;
            }
        }
        outcome
    }
}
