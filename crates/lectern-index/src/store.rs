use std::fs;
use std::path::Path;

use chrono::Utc;
use lectern_core::error::{Error, Result};
use lectern_core::types::{DocumentChunk, SearchHit};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

/// Result depth used when the caller does not ask for one.
pub const DEFAULT_TOP_K: usize = 5;

/// The only similarity metric this store records and understands.
pub const COSINE_METRIC: &str = "cosine";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS collections (
    name       TEXT PRIMARY KEY,
    metric     TEXT NOT NULL,
    dim        INTEGER,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    source     TEXT NOT NULL,
    content    TEXT NOT NULL,
    embedding  BLOB NOT NULL,
    seq        INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(collection, source);
";

/// Snapshot of one collection's footprint.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub collection: String,
    pub chunk_count: u64,
    pub source_count: u64,
    pub dimensions: Option<usize>,
}

/// SQLite-backed vector store scoped to one named collection.
///
/// Embeddings are stored as little-endian `f32` blobs and scored with an
/// exhaustive cosine scan, which holds up fine for corpora that fit in
/// memory. The first successful upsert fixes the collection's
/// dimensionality; the value is persisted and enforced across reopens.
pub struct VectorIndex {
    conn: Connection,
    collection: String,
    dim: Option<usize>,
}

impl VectorIndex {
    /// Opens the store at `db_path` and binds it to `collection`, creating
    /// both on first use. Parent directories are created on demand.
    pub fn open(db_path: &Path, collection: &str) -> Result<Self> {
        if collection.trim().is_empty() {
            return Err(Error::InvalidInput(
                "collection name must not be empty".to_string(),
            ));
        }
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(Error::index_io)?;
            }
        }
        let conn = Connection::open(db_path).map_err(Error::index_io)?;
        conn.execute_batch(SCHEMA).map_err(Error::index_io)?;

        let registered: Option<(String, Option<i64>)> = conn
            .query_row(
                "SELECT metric, dim FROM collections WHERE name = ?1",
                params![collection],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(Error::index_io)?;

        let dim = match registered {
            Some((metric, dim)) => {
                if metric != COSINE_METRIC {
                    return Err(Error::index_io(format!(
                        "collection '{collection}' uses metric '{metric}', only '{COSINE_METRIC}' is supported"
                    )));
                }
                dim.map(|d| d as usize)
            }
            None => {
                conn.execute(
                    "INSERT INTO collections (name, metric, created_at) VALUES (?1, ?2, ?3)",
                    params![collection, COSINE_METRIC, Utc::now().to_rfc3339()],
                )
                .map_err(Error::index_io)?;
                None
            }
        };

        tracing::debug!(path = %db_path.display(), collection, ?dim, "opened vector store");
        Ok(Self {
            conn,
            collection: collection.to_string(),
            dim,
        })
    }

    /// Inserts or replaces one entry. Replacement keeps the entry's original
    /// insertion rank, so repeated ingests do not shuffle tie-breaks.
    pub fn upsert(&mut self, id: &str, content: &str, embedding: &[f32]) -> Result<()> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput("entry id must not be empty".to_string()));
        }
        if embedding.is_empty() {
            return Err(Error::InvalidInput(
                "embedding must not be empty".to_string(),
            ));
        }
        if let Some(expected) = self.dim {
            if embedding.len() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        let blob = encode_embedding(embedding);
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction().map_err(Error::index_io)?;
        let next_seq: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM chunks WHERE collection = ?1",
                params![self.collection],
                |row| row.get(0),
            )
            .map_err(Error::index_io)?;
        tx.execute(
            "INSERT INTO chunks (collection, id, source, content, embedding, seq, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(collection, id) DO UPDATE SET
                 source = excluded.source,
                 content = excluded.content,
                 embedding = excluded.embedding,
                 updated_at = excluded.updated_at",
            params![self.collection, id, source_of(id), content, blob, next_seq, now],
        )
        .map_err(Error::index_io)?;
        if self.dim.is_none() {
            tx.execute(
                "UPDATE collections SET dim = ?1 WHERE name = ?2",
                params![embedding.len() as i64, self.collection],
            )
            .map_err(Error::index_io)?;
        }
        tx.commit().map_err(Error::index_io)?;
        if self.dim.is_none() {
            self.dim = Some(embedding.len());
        }
        Ok(())
    }

    /// Convenience wrapper for pipeline chunks.
    pub fn upsert_chunk(&mut self, chunk: &DocumentChunk, embedding: &[f32]) -> Result<()> {
        self.upsert(&chunk.id, &chunk.content, embedding)
    }

    /// Returns up to `top_k` entries ordered by ascending cosine distance.
    ///
    /// Depth defaults to [`DEFAULT_TOP_K`] and is clamped to at least one.
    /// Ties keep insertion order, so results are fully deterministic.
    pub fn query(&self, embedding: &[f32], top_k: Option<usize>) -> Result<Vec<SearchHit>> {
        let depth = top_k.unwrap_or(DEFAULT_TOP_K).max(1);
        if let Some(expected) = self.dim {
            if embedding.len() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT id, content, embedding FROM chunks WHERE collection = ?1 ORDER BY seq")
            .map_err(Error::index_io)?;
        let rows = stmt
            .query_map(params![self.collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(Error::index_io)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::index_io)?;

        let mut hits = Vec::with_capacity(rows.len());
        for (id, content, blob) in rows {
            let stored = decode_embedding(&id, &blob)?;
            let distance = cosine_distance(embedding, &stored);
            hits.push(SearchHit { id, content, distance });
        }
        // Rows arrive in insertion order and the sort is stable, so equal
        // distances resolve to the earlier entry.
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(depth);
        Ok(hits)
    }

    /// Removes one entry, reporting how many rows went away. Missing ids are
    /// a no-op.
    pub fn delete(&mut self, id: &str) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM chunks WHERE collection = ?1 AND id = ?2",
                params![self.collection, id],
            )
            .map_err(Error::index_io)
    }

    /// Removes every entry that belongs to `source`. Unknown sources are a
    /// no-op that reports zero.
    pub fn delete_by_source(&mut self, source: &str) -> Result<usize> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM chunks WHERE collection = ?1 AND source = ?2",
                params![self.collection, source],
            )
            .map_err(Error::index_io)?;
        tracing::debug!(collection = %self.collection, source, removed, "purged source entries");
        Ok(removed)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let (chunk_count, source_count): (u64, u64) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COUNT(DISTINCT source) FROM chunks WHERE collection = ?1",
                params![self.collection],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(Error::index_io)?;
        Ok(IndexStats {
            collection: self.collection.clone(),
            chunk_count,
            source_count,
            dimensions: self.dim,
        })
    }

    /// Dimensionality established by the first upsert, if any happened yet.
    pub fn dimensions(&self) -> Option<usize> {
        self.dim
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

/// Everything before the final `#` of an entry id names the artifact it came
/// from; ids without `#` are their own source.
fn source_of(id: &str) -> &str {
    id.rsplit_once('#').map_or(id, |(source, _)| source)
}

fn encode_embedding(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

fn decode_embedding(id: &str, bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::index_io(format!(
            "entry '{id}' has a corrupt embedding blob of {} bytes",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = (norm_a * norm_b).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    dot / denom
}
