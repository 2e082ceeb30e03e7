//! Wire protocol for the bidirectional channel.
//!
//! Every frame is a JSON object whose `type` field is the discriminant.
//! Inbound frames decode into a [`Command`]; unknown `type` values decode to
//! `None` and are ignored by the caller. Outbound frames are [`Frame`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{DispatchError, ProtocolError};

/// `topK` used when a search command carries none.
pub const DEFAULT_TOP_K: usize = 5;
/// Upper bound on results per search.
pub const MAX_TOP_K: usize = 10;

/// Inbound command from a client.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Greeting; answered with `hello_ack`.
    Hello {
        /// Client role, echoed verbatim.
        role: Option<String>,
    },
    /// Web search through the search provider.
    Search {
        /// Query text (`query` or `q` on the wire).
        query: Option<String>,
        /// Requested result count before clamping.
        top_k: Option<f64>,
    },
    /// Read one of the connection's stored search results.
    ReadResult {
        /// Raw index value as received.
        index: Option<Value>,
    },
    /// Read an arbitrary article URL.
    ReadUrl {
        /// Target URL.
        url: Option<String>,
    },
}

impl Command {
    /// Decode a raw inbound payload.
    ///
    /// Returns `Ok(None)` for a well-formed frame with an unrecognised
    /// `type`.
    pub fn parse(raw: &str) -> Result<Option<Self>, ProtocolError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Decode an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Option<Self>, ProtocolError> {
        let obj = value.as_object().ok_or(ProtocolError::NotAnObject)?;
        let tag = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingType)?;

        let command = match tag {
            "hello" => Self::Hello {
                role: optional_str(value, "role"),
            },
            "search" => Self::Search {
                query: optional_str(value, "query").or_else(|| optional_str(value, "q")),
                top_k: value.get("topK").and_then(Value::as_f64),
            },
            "read_result" => Self::ReadResult {
                index: value.get("index").cloned(),
            },
            "read_url" => Self::ReadUrl {
                url: optional_str(value, "url"),
            },
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::Search { .. } => "search",
            Self::ReadResult { .. } => "read_result",
            Self::ReadUrl { .. } => "read_url",
        }
    }

    /// Operation name carried by `error` frames for this command.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search_google",
            other => other.name(),
        }
    }
}

/// Clamp a requested `topK` to `[1, MAX_TOP_K]`, defaulting when absent.
pub fn clamp_top_k(requested: Option<f64>) -> usize {
    match requested {
        Some(n) if n.is_finite() => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = n.trunc().clamp(1.0, MAX_TOP_K as f64) as usize;
            n
        }
        _ => DEFAULT_TOP_K,
    }
}

/// Validate a `read_result` index against the number of stored results.
///
/// Any whole number is accepted, including float spellings like `1.0`.
pub fn resolve_index(index: Option<&Value>, len: usize) -> Result<usize, DispatchError> {
    let out_of_range = || DispatchError::IndexOutOfRange {
        index: index.map_or_else(|| "(missing)".to_owned(), Value::to_string),
        len,
    };
    let i = index.and_then(whole_number).ok_or_else(out_of_range)?;
    usize::try_from(i)
        .ok()
        .filter(|i| *i < len)
        .ok_or_else(out_of_range)
}

fn whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        let f = value.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0)?;
        #[allow(clippy::cast_possible_truncation)]
        let i = f as i64;
        Some(i)
    })
}

fn optional_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// One web search hit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Target URL.
    pub link: String,
    /// Short excerpt.
    pub snippet: String,
    /// Host shown to the user.
    pub display_link: String,
}

/// Outbound frame sent to a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Frame {
    /// Reply to `hello`.
    HelloAck {
        /// Echoed role.
        role: String,
    },
    /// Reply to a successful `search`.
    SearchResults {
        /// The query that was run.
        query: String,
        /// Returned hits, at most `topK`.
        results: Vec<SearchResult>,
    },
    /// A short article delivered whole.
    ArticleText {
        /// Article title.
        title: String,
        /// Full body text.
        body: String,
        /// URL the article was read from.
        source_url: String,
    },
    /// One piece of a long article.
    ArticleChunk {
        /// Article title, identical across the sequence.
        title: String,
        /// This piece of the body.
        chunk_text: String,
        /// Zero-based position in the sequence.
        chunk_index: usize,
        /// Length of the sequence.
        total_chunks: usize,
        /// URL the article was read from, identical across the sequence.
        source_url: String,
    },
    /// A recoverable failure.
    Error {
        /// Operation the client should route this failure to.
        operation: String,
        /// Human-readable description.
        message: String,
    },
}

impl Frame {
    /// Build an `error` frame.
    pub fn error(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// The `type` tag of this frame.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::HelloAck { .. } => "hello_ack",
            Self::SearchResults { .. } => "search_results",
            Self::ArticleText { .. } => "article_text",
            Self::ArticleChunk { .. } => "article_chunk",
            Self::Error { .. } => "error",
        }
    }

    /// Serialize to the wire representation.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_hello_with_role() {
        let cmd = Command::parse(r#"{"type":"hello","role":"speaker"}"#).unwrap();
        assert_eq!(
            cmd,
            Some(Command::Hello {
                role: Some("speaker".into())
            })
        );
    }

    #[test]
    fn parse_search_accepts_q_alias() {
        let cmd = Command::parse(r#"{"type":"search","q":"weather","topK":3}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            cmd,
            Command::Search {
                query: Some("weather".into()),
                top_k: Some(3.0)
            }
        );
        assert_eq!(cmd.operation(), "search_google");
    }

    #[test]
    fn parse_search_prefers_query_over_q() {
        let cmd = Command::parse(r#"{"type":"search","query":"a","q":"b"}"#)
            .unwrap()
            .unwrap();
        assert!(matches!(cmd, Command::Search { query: Some(q), .. } if q == "a"));
    }

    #[test]
    fn unknown_type_is_ignored() {
        assert_eq!(Command::parse(r#"{"type":"dance"}"#).unwrap(), None);
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = Command::parse("not json").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));
    }

    #[test]
    fn non_object_is_malformed() {
        assert_eq!(Command::parse("[1,2]").unwrap_err(), ProtocolError::NotAnObject);
    }

    #[test]
    fn missing_or_non_string_type_is_malformed() {
        assert_eq!(Command::parse(r#"{"q":"x"}"#).unwrap_err(), ProtocolError::MissingType);
        assert_eq!(Command::parse(r#"{"type":7}"#).unwrap_err(), ProtocolError::MissingType);
    }

    #[test]
    fn non_string_fields_read_as_absent() {
        let cmd = Command::parse(r#"{"type":"read_url","url":42}"#).unwrap().unwrap();
        assert_eq!(cmd, Command::ReadUrl { url: None });
    }

    #[test]
    fn top_k_clamping() {
        assert_eq!(clamp_top_k(None), DEFAULT_TOP_K);
        assert_eq!(clamp_top_k(Some(0.0)), 1);
        assert_eq!(clamp_top_k(Some(-4.0)), 1);
        assert_eq!(clamp_top_k(Some(3.0)), 3);
        assert_eq!(clamp_top_k(Some(3.9)), 3);
        assert_eq!(clamp_top_k(Some(50.0)), MAX_TOP_K);
    }

    #[test]
    fn resolve_index_bounds() {
        assert_eq!(resolve_index(Some(&json!(0)), 3).unwrap(), 0);
        assert_eq!(resolve_index(Some(&json!(2)), 3).unwrap(), 2);
        assert!(matches!(
            resolve_index(Some(&json!(3)), 3),
            Err(DispatchError::IndexOutOfRange { len: 3, .. })
        ));
        assert!(matches!(
            resolve_index(Some(&json!(-1)), 3),
            Err(DispatchError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn resolve_index_accepts_whole_floats() {
        assert_eq!(resolve_index(Some(&json!(1.0)), 3).unwrap(), 1);
        let parsed: Value = serde_json::from_str("1e0").unwrap();
        assert_eq!(resolve_index(Some(&parsed), 3).unwrap(), 1);
        assert!(matches!(
            resolve_index(Some(&json!(3.0)), 3),
            Err(DispatchError::IndexOutOfRange { .. })
        ));
        assert_eq!(resolve_index(Some(&json!(-0.0)), 3).unwrap(), 0);
    }

    #[test]
    fn resolve_index_rejects_non_integers() {
        for bad in [json!("1"), json!(1.5), json!(null)] {
            assert!(matches!(
                resolve_index(Some(&bad), 3),
                Err(DispatchError::IndexOutOfRange { .. })
            ));
        }
        let err = resolve_index(None, 2).unwrap_err();
        assert!(err.to_string().contains("(missing)"));
        assert!(err.to_string().contains("0-1"));
    }

    #[test]
    fn chunk_frame_uses_camel_case_fields() {
        let frame = Frame::ArticleChunk {
            title: "T".into(),
            chunk_text: "body".into(),
            chunk_index: 1,
            total_chunks: 3,
            source_url: "https://example.com/a".into(),
        };
        let v: Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(v["type"], "article_chunk");
        assert_eq!(v["chunkText"], "body");
        assert_eq!(v["chunkIndex"], 1);
        assert_eq!(v["totalChunks"], 3);
        assert_eq!(v["sourceUrl"], "https://example.com/a");
    }

    #[test]
    fn search_results_frame_shape() {
        let frame = Frame::SearchResults {
            query: "rust".into(),
            results: vec![SearchResult {
                title: "Rust".into(),
                link: "https://rust-lang.org".into(),
                snippet: "A language".into(),
                display_link: "rust-lang.org".into(),
            }],
        };
        let v = serde_json::to_value(&frame).unwrap();
        assert_eq!(v["type"], "search_results");
        assert_eq!(v["results"][0]["displayLink"], "rust-lang.org");
        assert_eq!(frame.type_name(), "search_results");
    }

    #[test]
    fn error_frame_shape() {
        let v = serde_json::to_value(Frame::error("read_url", "boom")).unwrap();
        assert_eq!(v, json!({"type": "error", "operation": "read_url", "message": "boom"}));
    }
}
