//! WebSocket session lifecycle: handles a single connected client from
//! upgrade through disconnect.
//!
//! Three pieces run per connection:
//!
//! - a reader task that keeps polling the socket, queues inbound text
//!   without waiting on the session loop, and flips the connection to
//!   `Closing` as soon as the peer goes away
//! - a writer task that drains the outbound queue and sends heartbeat pings
//! - the session loop itself, which handles inbound frames strictly one at a
//!   time, abandons the in-flight command once the connection starts
//!   closing, and owns cleanup
//!
//! The reader and writer share a per-connection child of the server's
//! shutdown token; whichever stops first cancels it and takes the other down.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use newswire_settings::ChannelMode;
use newswire_telemetry::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL,
    WS_DISCONNECTIONS_TOTAL,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::broadcast;
use super::connection::ClientConnection;
use crate::server::AppState;

/// Ping cadence and pong deadline.
#[derive(Clone, Copy, Debug)]
pub struct Heartbeat {
    /// Interval between server pings.
    pub interval: Duration,
    /// Disconnect after this long without a pong.
    pub timeout: Duration,
}

/// Run a WebSocket session for a connected client.
#[instrument(skip_all, fields(connection_id))]
pub async fn run_ws_session(ws: WebSocket, state: AppState) {
    let (conn, outbound_rx) = state.registry.register();
    let id = conn.id().clone();
    let _ = tracing::Span::current().record("connection_id", id.as_str());

    info!(mode = state.config.mode.as_str(), "client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    let heartbeat = Heartbeat {
        interval: state.config.heartbeat_interval,
        timeout: state.config.heartbeat_timeout,
    };
    let token = state.shutdown.connection_token();
    let (ws_tx, ws_rx) = ws.split();
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(write_loop(
        ws_tx,
        outbound_rx,
        Arc::clone(&conn),
        heartbeat,
        token.clone(),
    ));
    let reader = tokio::spawn(read_loop(ws_rx, inbound_tx, Arc::clone(&conn), token.clone()));

    loop {
        let text = tokio::select! {
            biased;
            () = token.cancelled() => break,
            text = inbound_rx.recv() => match text {
                Some(text) => text,
                None => break,
            },
        };
        if !conn.is_open() {
            break;
        }
        match state.config.mode {
            ChannelMode::Dispatch => {
                tokio::select! {
                    () = token.cancelled() => {
                        debug!("connection closing, abandoning in-flight command");
                        break;
                    }
                    outcome = state.dispatcher.handle(&conn, &text) => {
                        debug!(?outcome, "frame handled");
                    }
                }
            }
            ChannelMode::Broadcast => {
                let _ = broadcast::relay(&state.registry, &conn, &text);
            }
        }
    }

    // Clean up
    let _ = conn.begin_close();
    let _ = state.registry.unregister(&id);
    let _ = state.sessions.remove(&id);
    token.cancel();
    let _ = writer.await;
    let _ = reader.await;

    info!(age_secs = conn.age().as_secs(), "client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(conn.age().as_secs_f64());
}

/// Forward inbound text until the peer closes, errors, or the token fires.
async fn read_loop(
    mut ws_rx: SplitStream<WebSocket>,
    inbound: mpsc::UnboundedSender<String>,
    conn: Arc<ClientConnection>,
    token: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            () = token.cancelled() => break,
            next = ws_rx.next() => next,
        };

        // Binary frames carrying UTF-8 are treated as text.
        let text = match next {
            Some(Ok(Message::Text(t))) => t.to_string(),
            Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                Ok(s) => s,
                Err(_) => {
                    debug!(len = data.len(), "ignoring non-UTF-8 binary frame");
                    continue;
                }
            },
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                conn.mark_alive();
                continue;
            }
            Some(Ok(Message::Close(_))) => {
                debug!("client sent close frame");
                break;
            }
            Some(Err(e)) => {
                debug!(error = %e, "websocket read error");
                break;
            }
            None => break,
        };

        conn.mark_alive();
        if inbound.send(text).is_err() {
            break;
        }
    }

    let _ = conn.begin_close();
    token.cancel();
}

/// Drain the outbound queue onto the socket and keep the peer honest with
/// pings. Sends a Close frame on the way out.
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Arc<String>>,
    conn: Arc<ClientConnection>,
    heartbeat: Heartbeat,
    token: CancellationToken,
) {
    let mut ping = tokio::time::interval_at(
        tokio::time::Instant::now() + heartbeat.interval,
        heartbeat.interval,
    );
    let mut socket_ok = true;

    loop {
        tokio::select! {
            () = token.cancelled() => break,
            msg = outbound.recv() => {
                let Some(text) = msg else { break };
                if ws_tx.send(Message::Text(String::clone(&text).into())).await.is_err() {
                    socket_ok = false;
                    break;
                }
            }
            _ = ping.tick() => {
                if !conn.check_alive() && conn.last_pong_elapsed() > heartbeat.timeout {
                    warn!(timeout = ?heartbeat.timeout, "client unresponsive, disconnecting");
                    break;
                }
                if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                    socket_ok = false;
                    break;
                }
            }
        }
    }

    let _ = conn.begin_close();
    token.cancel();

    if socket_ok {
        // Frames already queued before the close still go out.
        while let Ok(text) = outbound.try_recv() {
            if ws_tx.send(Message::Text(String::clone(&text).into())).await.is_err() {
                return;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    }
}
