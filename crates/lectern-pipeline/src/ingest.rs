//! Ingestion: extract, chunk, embed and index one artifact at a time.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use lectern_core::config::IngestSettings;
use lectern_core::error::{Error, Result};
use lectern_core::traits::Embedder;
use lectern_core::types::IngestReport;
use lectern_extract::chunker::chunk_document;
use lectern_extract::extract::{extract_text, SourceArtifact};
use lectern_index::VectorIndex;
use tokio::sync::Mutex;

/// Drives one artifact through extraction, chunking, embedding and indexing.
///
/// Embeddings are requested in chunk order. With `embed_concurrency > 1` a
/// bounded window of requests is in flight at once; completed vectors are
/// still written back in chunk order, so ids and vectors stay paired.
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<Mutex<VectorIndex>>,
    chunk_size: usize,
    embed_concurrency: usize,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<Mutex<VectorIndex>>,
        settings: &IngestSettings,
    ) -> Self {
        Self {
            embedder,
            index,
            chunk_size: settings.chunk_size,
            embed_concurrency: settings.embed_concurrency.max(1),
        }
    }

    /// Reads `path` and ingests its contents under the file's name.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        let artifact = SourceArtifact::from_file(path)?;
        self.ingest(&artifact).await
    }

    /// Ingests an in-memory buffer under `name`, as an upload surface would
    /// hand it over.
    pub async fn ingest_bytes(
        &self,
        name: impl Into<String>,
        mime: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<IngestReport> {
        let artifact = SourceArtifact::new(name, mime, bytes);
        self.ingest(&artifact).await
    }

    /// Runs the whole pipeline for one artifact.
    ///
    /// Failures carry the artifact name. Chunks upserted before a failing
    /// step stay in the index; re-ingesting the artifact later overwrites
    /// them in place because chunk ids are deterministic.
    pub async fn ingest(&self, artifact: &SourceArtifact) -> Result<IngestReport> {
        match self.run(artifact).await {
            Ok(report) => {
                tracing::info!(
                    source = %report.source,
                    chunks = report.chunk_count(),
                    model = self.embedder.model_id(),
                    "ingested artifact"
                );
                Ok(report)
            }
            Err(err) => {
                tracing::warn!(source = %artifact.name, error = %err, "ingestion failed");
                Err(Error::ingest(artifact.name.clone(), err))
            }
        }
    }

    async fn run(&self, artifact: &SourceArtifact) -> Result<IngestReport> {
        let text = extract_text(artifact)?;
        let chunks = chunk_document(&artifact.name, &text, self.chunk_size);
        tracing::debug!(
            source = %artifact.name,
            chars = text.chars().count(),
            chunks = chunks.len(),
            "extracted and chunked artifact"
        );
        let mut report = IngestReport {
            source: artifact.name.clone(),
            chunk_ids: Vec::with_capacity(chunks.len()),
        };
        if chunks.is_empty() {
            return Ok(report);
        }

        let mut embedded = stream::iter(chunks.into_iter().map(|chunk| {
            let embedder = Arc::clone(&self.embedder);
            async move {
                let vector = embedder.embed(&chunk.content).await;
                (chunk, vector)
            }
        }))
        .buffered(self.embed_concurrency);

        while let Some((chunk, vector)) = embedded.next().await {
            let vector = vector?;
            let mut index = self.index.lock().await;
            index.upsert_chunk(&chunk, &vector)?;
            report.chunk_ids.push(chunk.id);
        }
        Ok(report)
    }
}
