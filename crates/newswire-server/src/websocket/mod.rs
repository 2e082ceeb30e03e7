//! WebSocket channel: connection state, registry, per-connection session
//! task, and broadcast relay.

pub mod broadcast;
pub mod connection;
pub mod registry;
pub mod session;
