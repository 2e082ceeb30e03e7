//! Chunk emitter: deterministic split of a long text into bounded pieces.
//!
//! Lengths are counted in Unicode scalar values. A piece ends right after
//! the last `.`, `?` or `!` that keeps it within the size bound; when there
//! is none, the piece is cut hard at the bound. Pieces are trimmed and empty
//! ones are dropped. The whole sequence is materialized up front because each
//! outbound frame carries the final count.

use crate::protocol::Frame;

/// Default maximum characters per chunk, and default whole-article threshold.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1000;

const SENTENCE_TERMINALS: [char; 3] = ['.', '?', '!'];

/// Split `text` into trimmed, non-empty pieces of at most `max_size` chars.
///
/// A `max_size` of zero is treated as one.
pub fn split_into_chunks(text: &str, max_size: usize) -> Vec<String> {
    let max_size = max_size.max(1);
    let chars: Vec<char> = text.chars().collect();

    if chars.len() <= max_size {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_owned()]
        };
    }

    let mut chunks = Vec::with_capacity(chars.len() / max_size + 1);
    let mut cursor = 0;

    while cursor < chars.len() {
        let candidate = cursor + max_size;
        let end = if candidate < chars.len() {
            // Last terminal at index p with p + 1 <= candidate, strictly after cursor.
            chars[cursor + 1..candidate]
                .iter()
                .rposition(|c| SENTENCE_TERMINALS.contains(c))
                .map_or(candidate, |offset| cursor + 1 + offset + 1)
        } else {
            chars.len()
        };

        let piece: String = chars[cursor..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_owned());
        }
        cursor = end;
    }

    chunks
}

/// Build the frames that deliver one article.
///
/// Bodies up to `threshold` characters go out as a single `article_text`;
/// longer bodies become an ordered run of `article_chunk` frames sharing
/// `title`, `source_url` and `total_chunks`.
pub fn article_frames(
    title: &str,
    body: &str,
    source_url: &str,
    threshold: usize,
    max_chunk_size: usize,
) -> Vec<Frame> {
    let whole = || Frame::ArticleText {
        title: title.to_owned(),
        body: body.to_owned(),
        source_url: source_url.to_owned(),
    };

    if body.chars().count() <= threshold {
        return vec![whole()];
    }

    let chunks = split_into_chunks(body, max_chunk_size);
    if chunks.is_empty() {
        return vec![whole()];
    }

    let total_chunks = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(chunk_index, chunk_text)| Frame::ArticleChunk {
            title: title.to_owned(),
            chunk_text,
            chunk_index,
            total_chunks,
            source_url: source_url.to_owned(),
        })
        .collect()
}
