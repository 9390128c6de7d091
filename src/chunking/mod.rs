//! Policy text chunking.
//!
//! Splits a policy into bounded chunks for per-chunk scoring. Boundaries
//! prefer paragraphs, then lines, then sentences, then words, and only
//! fall back to single characters when nothing else fits. Lengths are
//! counted in characters.

use thiserror::Error;
use tracing::{debug, warn};

/// Default maximum chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 3500;

/// Default overlap carried between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 350;

/// Default cap on the number of chunks sent for scoring.
pub const DEFAULT_MAX_CHUNKS: usize = 30;

const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Invalid splitter settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("chunk size must be at least 1")]
    ZeroChunkSize,

    #[error("chunk overlap ({overlap}) is larger than chunk size ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },

    #[error("max chunks must be at least 1")]
    ZeroMaxChunks,
}

/// Recursive character splitter.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    /// Create a splitter with the default separator hierarchy.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::ZeroChunkSize);
        }
        if chunk_overlap > chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                overlap: chunk_overlap,
                size: chunk_size,
            });
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Split text into trimmed, non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chunks = self.split_recursive(text, &self.separators);
        debug!("Split {} chars into {} chunks", char_len(text), chunks.len());
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // First separator present in the text; the empty separator always matches.
        let mut separator = "";
        let mut remaining: &[String] = &[];
        for (i, s) in separators.iter().enumerate() {
            if s.is_empty() || text.contains(s.as_str()) {
                separator = s.as_str();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(piece);
            } else {
                final_chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Greedily pack pieces into chunks, carrying trailing pieces forward
    /// as overlap. Pieces already include their separators.
    fn merge_splits(&self, splits: &[String]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut start = 0usize;
        let mut total = 0usize;

        for split in splits {
            let len = char_len(split);

            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of {} chars, longer than the limit of {}",
                        total, self.chunk_size
                    );
                }

                if start < current.len() {
                    if let Some(doc) = join_trimmed(&current[start..]) {
                        docs.push(doc);
                    }

                    while start < current.len()
                        && (total > self.chunk_overlap
                            || (total + len > self.chunk_size && total > 0))
                    {
                        total -= char_len(current[start]);
                        start += 1;
                    }
                }
            }

            current.push(split);
            total += len;
        }

        if let Some(doc) = join_trimmed(&current[start..]) {
            docs.push(doc);
        }

        docs
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Cap the number of chunks by merging the tail into the last slot.
pub fn cap_chunks(mut chunks: Vec<String>, max_chunks: usize) -> Result<Vec<String>, ChunkingError> {
    if max_chunks == 0 {
        return Err(ChunkingError::ZeroMaxChunks);
    }
    if chunks.len() <= max_chunks {
        return Ok(chunks);
    }

    debug!("Merging {} tail chunks", chunks.len() - max_chunks + 1);
    let tail = chunks.split_off(max_chunks - 1).join(" ");
    chunks.push(tail);
    Ok(chunks)
}

/// Split on `separator`, attaching each separator to the start of the
/// piece that follows it. Empty pieces are dropped. An empty separator
/// splits into single characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        pieces.push(&text[last..idx]);
        last = idx;
    }
    pieces.push(&text[last..]);

    pieces
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

fn join_trimmed(parts: &[&str]) -> Option<String> {
    let joined = parts.concat();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
