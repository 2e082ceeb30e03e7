//! Server-wide stop signal.
//!
//! One root `CancellationToken` is shared by the listener and every WebSocket
//! connection. Each connection runs on a child of the root: cancelling the
//! child closes that connection alone, cancelling the root stops accepting
//! and closes every connection.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long [`ShutdownCoordinator::graceful_shutdown`] waits by default.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Owner of the root stop token.
pub struct ShutdownCoordinator {
    root: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a coordinator with a fresh root token.
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
        }
    }

    /// The root token; the listener stops when it fires.
    pub fn token(&self) -> CancellationToken {
        self.root.clone()
    }

    /// A token for one connection: fires on server shutdown, and can be
    /// cancelled on its own when that connection ends.
    pub fn connection_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Stop the listener and close every connection.
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutting_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Fire the root token, then give `handles` (the serve task) up to
    /// `timeout` to finish.
    pub async fn graceful_shutdown(&self, handles: Vec<JoinHandle<()>>, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);
        self.shutdown();
        info!(
            tasks = handles.len(),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "closing connections and stopping listener"
        );

        if tokio::time::timeout(timeout, futures::future::join_all(handles))
            .await
            .is_err()
        {
            warn!(?timeout, "listener did not stop in time");
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
