//! # newswire-telemetry
//!
//! Process-wide observability: a `tracing` subscriber with pretty or JSON
//! output, and the Prometheus recorder behind `/metrics`.

#![deny(unsafe_code)]

mod logging;
pub mod metrics;

pub use logging::{TelemetryConfig, TelemetryError, filter_directives, init_logging};
pub use metrics::{install_recorder, render};
