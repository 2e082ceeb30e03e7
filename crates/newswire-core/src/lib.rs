//! # newswire-core
//!
//! Shared building blocks for the newswire backend:
//!
//! - [`ids`]: process-unique connection identifiers
//! - [`protocol`]: inbound [`Command`]s and outbound [`Frame`]s on the
//!   bidirectional channel
//! - [`chunk`]: the chunk emitter that splits long article bodies
//! - [`errors`]: protocol, dispatch, and provider error taxonomy
//! - [`providers`]: contracts for the feed, search, extraction, and stream
//!   probe collaborators

#![deny(unsafe_code)]

pub mod chunk;
pub mod errors;
pub mod ids;
pub mod protocol;
pub mod providers;

pub use chunk::{DEFAULT_MAX_CHUNK_SIZE, article_frames, split_into_chunks};
pub use errors::{DispatchError, ProtocolError, ProviderError};
pub use ids::ConnectionId;
pub use protocol::{Command, Frame, SearchResult};
pub use providers::{
    Article, ArticleExtractor, Feed, FeedFetcher, FeedItem, ProviderResult, SearchProvider,
    StreamProbe, StreamStatus,
};
