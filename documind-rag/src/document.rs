//! Data types for documents, chunks, and retrieved passages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata keys the ingestion pipeline owns. Caller-supplied extra
/// metadata is never allowed to override these.
pub const RESERVED_METADATA_KEYS: [&str; 5] =
    ["doc_id", "chunk_id", "chunk_index", "owner", "filename"];

/// A document submitted for ingestion.
///
/// The text is already extracted from the source format; extraction is an
/// upstream concern. `metadata` carries source attributes (title, author,
/// page_count, ...) that are copied onto every chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDocument {
    /// Unique identifier for the document.
    pub doc_id: String,
    /// The owning user; determines the index namespace.
    pub owner: String,
    /// Original filename, surfaced in answer citations.
    pub filename: String,
    /// The extracted plain text.
    pub text: String,
    /// Source metadata copied onto every chunk.
    pub metadata: HashMap<String, String>,
}

impl NewDocument {
    /// Create a document with empty metadata.
    pub fn new(
        doc_id: impl Into<String>,
        owner: impl Into<String>,
        filename: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            owner: owner.into(),
            filename: filename.into(),
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach source metadata.
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A bounded span of a document's text with its embedding: the atomic
/// unit of storage and retrieval. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier within the owner's namespace
    /// (`{doc_id}_chunk_{index}`).
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The embedding vector for this chunk's text.
    pub embedding: Vec<f32>,
    /// The parent document id.
    pub doc_id: String,
    /// The owning user.
    pub owner: String,
    /// Key-value metadata: the reserved keys plus any source metadata.
    pub metadata: HashMap<String, String>,
}

/// A [`Chunk`] paired with its raw nearest-neighbor distance.
///
/// Produced by [`VectorIndex::query`](crate::index::VectorIndex::query);
/// smaller distance means more similar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The stored chunk.
    pub chunk: Chunk,
    /// Cosine distance to the query vector.
    pub distance: f32,
}

/// A passage returned to callers by the retrieval engine.
///
/// Derived per query and never persisted. `score` is the normalized
/// similarity in `[0, 1]` (1 = identical).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// The passage text.
    pub content: String,
    /// The parent document id.
    pub doc_id: String,
    /// The chunk id the passage came from.
    pub chunk_id: String,
    /// Normalized similarity score in `[0, 1]`.
    pub score: f32,
    /// Metadata stored with the chunk.
    pub metadata: HashMap<String, String>,
}
