//! Domain types shared by the ingestion and retrieval pipelines.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// Deterministic chunk identifier: `<source>#<index>`.
///
/// Re-ingesting an artifact under the same name reproduces the same ids,
/// so repeat runs overwrite entries instead of duplicating them. The `#`
/// boundary is also where the index recovers an entry's source for
/// source-scoped deletion.
pub fn chunk_id(source: &str, index: usize) -> ChunkId {
    format!("{source}#{index}")
}

/// A chunk of a source document that is independently embedded and indexed.
///
/// - `id`: `<source>#<index>`, unique per (artifact, chunk offset)
/// - `source`: declared name of the source artifact
/// - `content`: the literal substring of the extracted text; non-empty
/// - `chunk_index`: zero-based position within the parent document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub source: String,
    pub content: String,
    pub chunk_index: usize,
}

impl DocumentChunk {
    pub fn new(source: &str, chunk_index: usize, content: String) -> Self {
        Self {
            id: chunk_id(source, chunk_index),
            source: source.to_string(),
            content,
            chunk_index,
        }
    }
}

/// One nearest-neighbor result from the vector index.
///
/// `distance` is cosine distance (`1 - similarity`), so lower is more
/// similar. Results are ordered ascending by distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub content: String,
    pub distance: f32,
}

/// One conversation turn, in the wire shape chat endpoints expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Outcome of ingesting one source artifact: the ids written, in chunk
/// order. Partial runs are reported by the error path, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub source: String,
    pub chunk_ids: Vec<ChunkId>,
}

impl IngestReport {
    pub fn chunk_count(&self) -> usize {
        self.chunk_ids.len()
    }
}
