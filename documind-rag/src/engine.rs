//! RAG engine orchestrator.
//!
//! The [`RagEngine`] coordinates the write path (chunk → embed → index)
//! and the read path (embed → query → score → dedup) by composing a
//! [`Chunker`], an [`EmbeddingProvider`], and a [`VectorIndex`].
//! Construct one via [`RagEngine::builder()`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use documind_rag::{BoundaryChunker, InMemoryVectorIndex, NewDocument, RagConfig, RagEngine};
//!
//! let engine = RagEngine::builder()
//!     .config(RagConfig::default())
//!     .embedder(Arc::new(my_embedder))
//!     .index(Arc::new(InMemoryVectorIndex::new(384)))
//!     .chunker(Arc::new(BoundaryChunker::new(800, 200)))
//!     .build()?;
//!
//! let chunk_count = engine.ingest(&document).await?;
//! let passages = engine.retrieve("alice", "what is chunking?", None, None).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::dedup;
use crate::document::{Chunk, NewDocument, RetrievedPassage, ScoredChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{MetadataFilter, VectorIndex};

/// Cap on the candidate pool fetched for deduplicated search, bounding
/// the O(n²) dedup pass.
const CANDIDATE_POOL_CAP: usize = 50;

/// Convert a raw index distance to a similarity score in `[0, 1]`.
///
/// Assumes the distance is roughly bounded in `[0, 1]`, which holds for
/// cosine distance over embeddings with non-negative similarity. A
/// deployment switching to an unbounded metric must re-derive this
/// mapping.
pub(crate) fn distance_to_score(distance: f32) -> f32 {
    (1.0 - distance).max(0.0)
}

fn passage_from(scored: ScoredChunk) -> RetrievedPassage {
    RetrievedPassage {
        content: scored.chunk.text,
        doc_id: scored.chunk.doc_id,
        chunk_id: scored.chunk.id,
        score: distance_to_score(scored.distance),
        metadata: scored.chunk.metadata,
    }
}

/// The per-user RAG orchestrator.
///
/// All operations are scoped by `owner`; the engine trusts the supplied
/// identifier completely (authentication happens upstream) and relies on
/// the [`VectorIndex`] namespace partitioning for tenancy isolation.
pub struct RagEngine {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    chunker: Arc<dyn Chunker>,
}

impl RagEngine {
    /// Create a new [`RagEngineBuilder`].
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Ingest a document: chunk → embed → index.
    ///
    /// Chunk ids are `{doc_id}_chunk_{index}`; each chunk's metadata is
    /// the document's source metadata with the reserved keys written on
    /// top, so caller-supplied metadata can never override them. All
    /// spans are embedded in one batched call and written in one index
    /// call, so a failure leaves no partial chunk set behind.
    ///
    /// Returns the number of chunks stored.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyContent`] if the text is empty after trimming.
    /// - [`RagError::NoChunksProduced`] if chunking yields zero spans.
    /// - [`RagError::Ingestion`] wrapping any embedding or index failure
    ///   (including [`RagError::DuplicateId`] on chunk id collision).
    pub async fn ingest(&self, document: &NewDocument) -> Result<usize> {
        if document.text.trim().is_empty() {
            return Err(RagError::EmptyContent);
        }

        let spans = self.chunker.chunk(&document.text);
        if spans.is_empty() {
            return Err(RagError::NoChunksProduced);
        }

        let texts: Vec<&str> = spans.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(doc_id = %document.doc_id, error = %e, "embedding failed during ingestion");
            RagError::Ingestion { doc_id: document.doc_id.clone(), source: Box::new(e) }
        })?;

        if embeddings.len() != spans.len() {
            return Err(RagError::Ingestion {
                doc_id: document.doc_id.clone(),
                source: Box::new(RagError::Backend {
                    backend: "embedder".into(),
                    message: format!(
                        "{} embeddings returned for {} spans",
                        embeddings.len(),
                        spans.len()
                    ),
                }),
            });
        }

        let chunks: Vec<Chunk> = spans
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (text, embedding))| build_chunk(document, index, text, embedding))
            .collect();

        self.index.add(&document.owner, &chunks).await.map_err(|e| {
            error!(doc_id = %document.doc_id, error = %e, "index write failed during ingestion");
            RagError::Ingestion { doc_id: document.doc_id.clone(), source: Box::new(e) }
        })?;

        info!(
            doc_id = %document.doc_id,
            owner = %document.owner,
            chunk_count = chunks.len(),
            "ingested document"
        );
        Ok(chunks.len())
    }

    /// Retrieve the `top_k` nearest passages for a query, nearest first.
    ///
    /// `top_k` falls back to the configured default; `doc_ids` restricts
    /// results to the given documents. An empty result is a valid
    /// outcome, including for an owner who never ingested anything.
    pub async fn retrieve(
        &self,
        owner: &str,
        query: &str,
        top_k: Option<usize>,
        doc_ids: Option<&[String]>,
    ) -> Result<Vec<RetrievedPassage>> {
        let k = top_k.unwrap_or(self.config.top_k);
        let results = self.query_index(owner, query, k, doc_ids).await?;
        let passages: Vec<RetrievedPassage> = results.into_iter().map(passage_from).collect();

        info!(owner, passage_count = passages.len(), "retrieval completed");
        Ok(passages)
    }

    /// Semantic search with near-duplicate removal.
    ///
    /// Fetches up to `min(2 * top_k, 50)` candidates to leave headroom
    /// for removed duplicates, deduplicates them, and truncates to
    /// `top_k`, highest score first.
    pub async fn search(
        &self,
        owner: &str,
        query: &str,
        top_k: Option<usize>,
        doc_ids: Option<&[String]>,
    ) -> Result<Vec<RetrievedPassage>> {
        let k = top_k.unwrap_or(self.config.search_top_k);
        let pool = k.saturating_mul(2).min(CANDIDATE_POOL_CAP);

        let results = self.query_index(owner, query, pool, doc_ids).await?;
        let passages: Vec<RetrievedPassage> = results.into_iter().map(passage_from).collect();

        let mut deduplicated = dedup::dedupe(passages);
        deduplicated.truncate(k);

        info!(owner, passage_count = deduplicated.len(), "search completed");
        Ok(deduplicated)
    }

    /// Remove every chunk of a document from the owner's namespace.
    ///
    /// Safe to call for a document with no indexed chunks.
    pub async fn delete_document(&self, owner: &str, doc_id: &str) -> Result<()> {
        self.index.delete(owner, &MetadataFilter::key_eq("doc_id", doc_id)).await?;
        info!(owner, doc_id, "deleted document chunks");
        Ok(())
    }

    async fn query_index(
        &self,
        owner: &str,
        query: &str,
        k: usize,
        doc_ids: Option<&[String]>,
    ) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embed_query(query).await?;
        let filter = doc_ids.map(|ids| MetadataFilter::key_in("doc_id", ids.iter().cloned()));
        self.index.query(owner, &query_embedding, k, filter.as_ref()).await
    }

    /// Queries go through the batch path so the engine exercises one
    /// code path on the embedding backend.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embedder.embed_batch(&[query]).await?;
        vectors.pop().ok_or_else(|| RagError::Backend {
            backend: "embedder".into(),
            message: "empty embedding batch for query".into(),
        })
    }
}

fn build_chunk(document: &NewDocument, index: usize, text: String, embedding: Vec<f32>) -> Chunk {
    let chunk_id = format!("{}_chunk_{index}", document.doc_id);

    // Reserved keys go in last so extra metadata cannot override them.
    let mut metadata = document.metadata.clone();
    metadata.insert("doc_id".to_string(), document.doc_id.clone());
    metadata.insert("chunk_id".to_string(), chunk_id.clone());
    metadata.insert("chunk_index".to_string(), index.to_string());
    metadata.insert("owner".to_string(), document.owner.clone());
    metadata.insert("filename".to_string(), document.filename.clone());

    Chunk {
        id: chunk_id,
        text,
        embedding,
        doc_id: document.doc_id.clone(),
        owner: document.owner.clone(),
        metadata,
    }
}

/// Builder for constructing a [`RagEngine`].
///
/// `embedder`, `index`, and `chunker` are required; `config` defaults to
/// [`RagConfig::default()`].
#[derive(Default)]
pub struct RagEngineBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<dyn VectorIndex>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagEngineBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector index backend.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagEngine`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing.
    pub fn build(self) -> Result<RagEngine> {
        let embedder =
            self.embedder.ok_or_else(|| RagError::Config("embedder is required".to_string()))?;
        let index = self.index.ok_or_else(|| RagError::Config("index is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;

        Ok(RagEngine { config: self.config.unwrap_or_default(), embedder, index, chunker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_maps_to_full_score() {
        assert_eq!(distance_to_score(0.0), 1.0);
    }

    #[test]
    fn unit_distance_maps_to_zero_score() {
        assert_eq!(distance_to_score(1.0), 0.0);
    }

    #[test]
    fn scores_are_clamped_never_negative() {
        assert_eq!(distance_to_score(1.5), 0.0);
    }
}
