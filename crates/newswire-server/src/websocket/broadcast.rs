//! Broadcast mode: relay each well-formed frame verbatim to every other
//! open connection.

use std::sync::Arc;

use metrics::counter;
use newswire_telemetry::metrics::{WS_BROADCAST_DROPS_TOTAL, WS_BROADCAST_RELAYED_TOTAL};
use serde::de::IgnoredAny;
use tracing::{debug, warn};

use super::connection::ClientConnection;
use super::registry::{ConnectionRegistry, FanOut};

/// Relay `raw` from `sender` to all other open connections.
///
/// Payloads that are not well-formed JSON are dropped silently and the
/// sender stays connected. Returns `None` for a dropped payload.
pub fn relay(registry: &ConnectionRegistry, sender: &ClientConnection, raw: &str) -> Option<FanOut> {
    if serde_json::from_str::<IgnoredAny>(raw).is_err() {
        debug!(connection_id = %sender.id(), "dropping malformed broadcast frame");
        return None;
    }

    let payload = Arc::new(raw.to_owned());
    let outcome = registry.broadcast_from(sender.id(), &payload);

    counter!(WS_BROADCAST_RELAYED_TOTAL).increment(as_u64(outcome.delivered));
    if outcome.dropped > 0 {
        counter!(WS_BROADCAST_DROPS_TOTAL).increment(as_u64(outcome.dropped));
        warn!(
            connection_id = %sender.id(),
            dropped = outcome.dropped,
            "broadcast recipients had full queues"
        );
    }
    Some(outcome)
}

fn as_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}
