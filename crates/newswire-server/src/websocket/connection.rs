//! WebSocket client connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use newswire_core::{ConnectionId, Frame};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

/// Liveness of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepting and delivering frames.
    Open,
    /// Shutting down; nothing more is delivered.
    Closing,
    /// Removed from the registry.
    Closed,
}

impl ConnectionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Closing => 1,
            Self::Closed => 2,
        }
    }
}

/// One connected WebSocket client.
///
/// Outbound frames go through a bounded queue drained by the connection's
/// writer task. Nothing is enqueued once the connection has left
/// [`ConnectionState::Open`].
pub struct ClientConnection {
    id: ConnectionId,
    tx: mpsc::Sender<Arc<String>>,
    state: AtomicU8,
    /// When this connection was established.
    pub connected_at: Instant,
    is_alive: AtomicBool,
    last_pong: Mutex<Instant>,
    dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create an open connection that enqueues onto `tx`.
    pub fn new(id: ConnectionId, tx: mpsc::Sender<Arc<String>>) -> Self {
        let now = Instant::now();
        Self {
            id,
            tx,
            state: AtomicU8::new(ConnectionState::Open.as_u8()),
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Connection id.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Current liveness state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether frames may still be delivered.
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Move `Open` to `Closing`. Returns `false` if already past `Open`.
    pub fn begin_close(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Open.as_u8(),
                ConnectionState::Closing.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Mark the connection closed.
    pub fn mark_closed(&self) {
        self.state
            .store(ConnectionState::Closed.as_u8(), Ordering::Release);
    }

    /// Serialize `frame` and enqueue it, waiting for queue capacity.
    ///
    /// Returns `false` when the connection is no longer open or its writer
    /// has gone away.
    pub async fn deliver(&self, frame: &Frame) -> bool {
        if !self.is_open() {
            return false;
        }
        match frame.to_json() {
            Ok(json) => self.deliver_raw(Arc::new(json)).await,
            Err(e) => {
                warn!(connection_id = %self.id, error = %e, "failed to serialize frame");
                false
            }
        }
    }

    /// Enqueue a pre-serialized payload, waiting for queue capacity.
    pub async fn deliver_raw(&self, payload: Arc<String>) -> bool {
        self.is_open() && self.tx.send(payload).await.is_ok()
    }

    /// Enqueue without waiting.
    ///
    /// Returns `false` if the connection is not open or its queue is full or
    /// closed; a full queue increments the dropped message counter.
    pub fn try_deliver(&self, payload: Arc<String>) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.tx.try_send(payload) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Total payloads dropped on a full queue.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Mark the connection as alive (pong or any inbound activity).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag for heartbeat.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
