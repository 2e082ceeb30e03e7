//! Error taxonomy for the channel protocol and its providers.
//!
//! Nothing here is fatal to the process. Protocol and dispatch errors are
//! answered with an `error` frame on the originating connection; provider
//! errors are surfaced the same way by the dispatcher and as HTTP error
//! bodies by the REST routes.

use std::time::Duration;

/// An inbound frame that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Payload is not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    /// Payload is JSON but not an object.
    #[error("Frame must be a JSON object")]
    NotAnObject,
    /// Object has no string `type` discriminant.
    #[error("Frame is missing a string \"type\" field")]
    MissingType,
}

/// Failure reported by an external provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Credentials or other required configuration are absent.
    #[error("{message}")]
    Configuration {
        /// Description.
        message: String,
    },
    /// The target URL is malformed or uses an unsupported scheme.
    #[error("{message}")]
    InvalidUrl {
        /// Description.
        message: String,
    },
    /// Network failure or non-success HTTP status while fetching.
    #[error("{message}")]
    Fetch {
        /// Description.
        message: String,
    },
    /// Upstream API answered with an error status.
    #[error("Upstream error {status}: {message}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Upstream message, or the status reason.
        message: String,
    },
    /// The page was fetched but no readable text could be found.
    #[error("Could not extract article content from this URL")]
    NoContentExtracted,
    /// The upstream document could not be parsed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description.
        message: String,
    },
    /// The call did not finish within its time bound.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Short classification string for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Fetch { .. } => "fetch",
            Self::Upstream { .. } => "upstream",
            Self::NoContentExtracted => "no_content",
            Self::Parse { .. } => "parse",
            Self::Timeout(_) => "timeout",
        }
    }

    /// Shorthand for a [`ProviderError::Fetch`].
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Shorthand for a [`ProviderError::InvalidUrl`].
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: message.into(),
        }
    }
}

/// Failure while handling one command on a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The frame could not be decoded.
    #[error(transparent)]
    MalformedInput(#[from] ProtocolError),
    /// A required parameter is absent or empty.
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// Parameter name as it appears on the wire.
        name: &'static str,
    },
    /// `read_result` arrived before any successful search.
    #[error("No search results available. Run a search first.")]
    NoResultsAvailable,
    /// `read_result` index is not an integer within the stored results.
    #[error("Index {index} is out of range. Valid range: 0-{max}", max = .len.saturating_sub(1))]
    IndexOutOfRange {
        /// The index as received.
        index: String,
        /// Number of stored results.
        len: usize,
    },
    /// The provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl DispatchError {
    /// Short classification string for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::MissingParameter { .. } => "missing_parameter",
            Self::NoResultsAvailable => "no_results_available",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::Provider(e) => e.kind(),
        }
    }
}
