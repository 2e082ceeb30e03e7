//! Command dispatcher: the single entry point for inbound frames in
//! dispatch mode.
//!
//! One call to [`Dispatcher::handle`] decodes a frame, runs the command
//! against the providers, updates the connection's own session, and enqueues
//! every resulting frame on that same connection before returning. The
//! connection task awaits it, so commands from one connection never overlap.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use newswire_core::protocol::{clamp_top_k, resolve_index};
use newswire_core::{
    ArticleExtractor, Command, DispatchError, Frame, SearchProvider, article_frames,
};
use newswire_telemetry::metrics::{
    COMMAND_DURATION_SECONDS, COMMAND_ERRORS_TOTAL, COMMANDS_TOTAL, FRAMES_SENT_TOTAL,
};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::providers::bounded;
use crate::sessions::SessionStore;
use crate::websocket::connection::ClientConnection;

/// Role echoed when `hello` carries none.
const DEFAULT_ROLE: &str = "unknown";

/// Operation name for frames that could not be decoded.
const PARSE_OPERATION: &str = "parse";

/// Article delivery limits.
#[derive(Clone, Copy, Debug)]
pub struct DeliveryLimits {
    /// Bodies up to this many characters go out whole.
    pub chunk_threshold: usize,
    /// Upper bound on characters per chunk.
    pub max_chunk_size: usize,
}

/// What happened to one inbound frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Well-formed frame with an unknown `type`.
    Ignored,
    /// The command succeeded.
    Handled {
        /// Command name.
        command: &'static str,
        /// Frames enqueued on the connection.
        frames_sent: usize,
    },
    /// The command failed and an `error` frame was sent (if still open).
    Failed {
        /// Operation named in the `error` frame.
        operation: &'static str,
        /// Error classification.
        kind: &'static str,
    },
}

/// Routes commands to providers and writes replies to the originating
/// connection.
pub struct Dispatcher {
    search: Arc<dyn SearchProvider>,
    articles: Arc<dyn ArticleExtractor>,
    sessions: Arc<SessionStore>,
    limits: DeliveryLimits,
    provider_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(
        search: Arc<dyn SearchProvider>,
        articles: Arc<dyn ArticleExtractor>,
        sessions: Arc<SessionStore>,
        limits: DeliveryLimits,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            search,
            articles,
            sessions,
            limits,
            provider_timeout,
        }
    }

    /// The session store this dispatcher writes to.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one raw inbound payload from `conn`.
    #[instrument(skip_all, fields(connection_id = %conn.id()))]
    pub async fn handle(&self, conn: &ClientConnection, raw: &str) -> DispatchOutcome {
        let command = match Command::parse(raw) {
            Ok(Some(command)) => command,
            Ok(None) => {
                debug!("ignoring frame with unknown type");
                return DispatchOutcome::Ignored;
            }
            Err(e) => {
                let err = DispatchError::from(e);
                return self.fail(conn, PARSE_OPERATION, &err).await;
            }
        };

        let _ = self.sessions.get_or_create(conn.id());
        let name = command.name();
        counter!(COMMANDS_TOTAL, "command" => name).increment(1);
        let start = Instant::now();

        let outcome = match self.execute(conn, command.clone()).await {
            Ok(frames) => DispatchOutcome::Handled {
                command: name,
                frames_sent: send_all(conn, &frames).await,
            },
            Err(err) => self.fail(conn, command.operation(), &err).await,
        };

        histogram!(COMMAND_DURATION_SECONDS, "command" => name)
            .record(start.elapsed().as_secs_f64());
        outcome
    }

    async fn execute(
        &self,
        conn: &ClientConnection,
        command: Command,
    ) -> Result<Vec<Frame>, DispatchError> {
        match command {
            Command::Hello { role } => Ok(vec![Frame::HelloAck {
                role: role.unwrap_or_else(|| DEFAULT_ROLE.to_owned()),
            }]),
            Command::Search { query, top_k } => self.search(conn, query, top_k).await,
            Command::ReadResult { index } => self.read_result(conn, index).await,
            Command::ReadUrl { url } => {
                let url = non_empty(url).ok_or(DispatchError::MissingParameter { name: "url" })?;
                self.read_article(&url).await
            }
        }
    }

    async fn search(
        &self,
        conn: &ClientConnection,
        query: Option<String>,
        top_k: Option<f64>,
    ) -> Result<Vec<Frame>, DispatchError> {
        let query = non_empty(query).ok_or(DispatchError::MissingParameter { name: "query" })?;
        let top_k = clamp_top_k(top_k);

        let mut results = bounded(
            "search",
            self.provider_timeout,
            self.search.search(&query, top_k),
        )
        .await?;
        results.truncate(top_k);

        if !conn.is_open() || !self.sessions.replace_results(conn.id(), results.clone()) {
            debug!("connection closed during search, discarding results");
            return Ok(Vec::new());
        }

        Ok(vec![Frame::SearchResults { query, results }])
    }

    async fn read_result(
        &self,
        conn: &ClientConnection,
        index: Option<Value>,
    ) -> Result<Vec<Frame>, DispatchError> {
        let results = self.sessions.results(conn.id());
        if results.is_empty() {
            return Err(DispatchError::NoResultsAvailable);
        }
        let i = resolve_index(index.as_ref(), results.len())?;
        self.read_article(&results[i].link).await
    }

    async fn read_article(&self, url: &str) -> Result<Vec<Frame>, DispatchError> {
        let article = bounded("article", self.provider_timeout, self.articles.extract(url)).await?;
        Ok(article_frames(
            &article.title,
            &article.body_text,
            url,
            self.limits.chunk_threshold,
            self.limits.max_chunk_size,
        ))
    }

    async fn fail(
        &self,
        conn: &ClientConnection,
        operation: &'static str,
        err: &DispatchError,
    ) -> DispatchOutcome {
        let kind = err.kind();
        counter!(COMMAND_ERRORS_TOTAL, "operation" => operation, "kind" => kind).increment(1);

        if conn.is_open() {
            warn!(operation, kind, error = %err, "command failed");
            let _ = send_all(conn, &[Frame::error(operation, err.to_string())]).await;
        } else {
            debug!(operation, kind, "connection closed, dropping error");
        }
        DispatchOutcome::Failed { operation, kind }
    }
}

/// Enqueue `frames` in order, stopping at the first one the connection
/// refuses. Returns how many were enqueued.
async fn send_all(conn: &ClientConnection, frames: &[Frame]) -> usize {
    let mut sent = 0;
    for frame in frames {
        if !conn.deliver(frame).await {
            debug!(
                remaining = frames.len() - sent,
                "connection no longer open, discarding frames"
            );
            break;
        }
        counter!(FRAMES_SENT_TOTAL, "type" => frame.type_name()).increment(1);
        sent += 1;
    }
    sent
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
