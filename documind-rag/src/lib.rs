//! # documind-rag
//!
//! The retrieval-augmented generation core of DocuMind: users upload
//! documents, the engine indexes their content into a per-user vector
//! namespace, and queries retrieve relevant passages to ground a
//! streamed model answer.
//!
//! ## Overview
//!
//! - [`BoundaryChunker`] — splits text into overlapping spans at natural
//!   boundaries
//! - [`EmbeddingProvider`] — text → fixed-dimension vectors
//!   ([`GeminiEmbeddingProvider`], with [`LazyEmbedder`] for one-time
//!   deferred loading)
//! - [`VectorIndex`] — namespace-isolated nearest-neighbor storage
//!   ([`InMemoryVectorIndex`])
//! - [`RagEngine`] — the ingest / retrieve / search orchestrator
//! - [`AnswerEngine`] — context assembly and streamed answer generation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use documind_rag::{
//!     AnswerEngine, BoundaryChunker, GeminiEmbeddingProvider, InMemoryVectorIndex,
//!     NewDocument, RagConfig, RagEngine,
//! };
//!
//! let config = RagConfig::default();
//! let embedder = Arc::new(GeminiEmbeddingProvider::from_env()?);
//! let engine = RagEngine::builder()
//!     .config(config.clone())
//!     .embedder(embedder.clone())
//!     .index(Arc::new(InMemoryVectorIndex::new(embedder.dimensions())))
//!     .chunker(Arc::new(BoundaryChunker::new(config.chunk_size, config.chunk_overlap)))
//!     .build()?;
//!
//! let doc = NewDocument::new("doc-1", "alice", "notes.pdf", extracted_text);
//! let chunk_count = engine.ingest(&doc).await?;
//! let passages = engine.search("alice", "how does ingestion work?", None, None).await?;
//! ```
//!
//! Tenancy isolation is the central invariant: every operation is scoped
//! to an `owner`, and retrieval for one owner can never surface another
//! owner's chunks. The engine trusts the caller-supplied owner; user
//! authentication is an upstream concern.

pub mod answer;
pub mod chunking;
pub mod config;
mod dedup;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod gemini;
pub mod index;
pub mod inmemory;

pub use answer::{AnswerEngine, AnswerEvent, AnswerStream, build_context};
pub use chunking::{BoundaryChunker, Chunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    Chunk, NewDocument, RESERVED_METADATA_KEYS, RetrievedPassage, ScoredChunk,
};
pub use embedding::{EmbeddingProvider, LazyEmbedder};
pub use engine::{RagEngine, RagEngineBuilder};
pub use error::{RagError, Result};
pub use gemini::GeminiEmbeddingProvider;
pub use index::{MetadataFilter, VectorIndex};
pub use inmemory::InMemoryVectorIndex;
