//! Error types for the `documind-rag` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The document text was empty after trimming.
    #[error("document contains no extractable text")]
    EmptyContent,

    /// Chunking produced zero spans from non-empty text.
    #[error("no chunks produced from document text")]
    NoChunksProduced,

    /// A chunk id already exists in the owner's namespace.
    #[error("duplicate chunk id '{id}'")]
    DuplicateId {
        /// The offending chunk id.
        id: String,
    },

    /// A vector's dimensionality does not match the index.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality the index was created with.
        expected: usize,
        /// Dimensionality of the rejected vector.
        actual: usize,
    },

    /// The embedding model could not be loaded. Fatal for the process;
    /// every embedding call fails with this until restart.
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// A backend (vector store or LLM) failed or is unreachable.
    #[error("backend error ({backend}): {message}")]
    Backend {
        /// The backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The write path failed for a document; wraps the underlying cause.
    #[error("ingestion failed for document '{doc_id}': {source}")]
    Ingestion {
        /// The document being ingested.
        doc_id: String,
        /// The underlying failure.
        #[source]
        source: Box<RagError>,
    },

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
