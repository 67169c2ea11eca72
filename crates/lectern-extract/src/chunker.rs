//! Fixed-size text chunking.
//!
//! Splits extracted document text into the units the vector index stores.
//! Deliberately dumb: fixed character windows, no overlap, no boundary
//! snapping, no trimming. Concatenating the chunks reproduces the input
//! exactly, and chunk ids stay deterministic across repeat runs.

use lectern_core::types::DocumentChunk;

/// Chunk length, in characters, used when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 300;

/// Split `text` into consecutive windows of `size` characters; the final
/// window may be shorter. Boundaries always fall on `char` boundaries.
/// Empty input (or a size of 0) yields no chunks.
pub fn split_text(text: &str, size: usize) -> Vec<String> {
    if text.is_empty() || size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::with_capacity(size);
    let mut count = 0usize;
    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split and label: one `DocumentChunk` per window, ids `<source>#<index>`.
pub fn chunk_document(source: &str, text: &str, size: usize) -> Vec<DocumentChunk> {
    split_text(text, size)
        .into_iter()
        .enumerate()
        .map(|(index, content)| DocumentChunk::new(source, index, content))
        .collect()
}
