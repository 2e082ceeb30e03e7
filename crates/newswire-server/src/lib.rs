//! # newswire-server
//!
//! Axum HTTP + WebSocket server for the newswire backend.
//!
//! - [`server`]: [`NewswireServer`] router, state, and listener
//! - [`websocket`]: per-connection session tasks, the connection registry,
//!   and the broadcast relay
//! - [`dispatcher`]: command handling for dispatch mode
//! - [`sessions`]: per-connection search results
//! - [`routes`]: the REST API used by the browser client
//! - [`providers`]: the provider set and bounded provider calls
//! - [`config`], [`health`], [`shutdown`]: ambient plumbing

#![deny(unsafe_code)]

pub mod config;
pub mod dispatcher;
pub mod health;
pub mod providers;
pub mod routes;
pub mod server;
pub mod sessions;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use dispatcher::{DeliveryLimits, DispatchOutcome, Dispatcher};
pub use providers::ProviderSet;
pub use server::{AppState, NewswireServer};
pub use sessions::SessionStore;
pub use shutdown::ShutdownCoordinator;
