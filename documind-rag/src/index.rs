//! Vector index trait: namespace-isolated storage with nearest-neighbor
//! queries.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::document::{Chunk, ScoredChunk};
use crate::error::Result;

/// A metadata predicate: matches chunks whose value under `key` equals
/// one of `values`.
///
/// Covers both the query-time document filter (`doc_id` in a set) and
/// bulk deletion of a single document (`doc_id` equals one value).
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFilter {
    key: String,
    values: Vec<String>,
}

impl MetadataFilter {
    /// Match chunks whose `key` value is any of `values`.
    pub fn key_in<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { key: key.into(), values: values.into_iter().map(Into::into).collect() }
    }

    /// Match chunks whose `key` value equals `value`.
    pub fn key_eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), values: vec![value.into()] }
    }

    /// Whether the given chunk metadata satisfies this filter.
    pub fn matches(&self, metadata: &HashMap<String, String>) -> bool {
        metadata.get(&self.key).is_some_and(|value| self.values.iter().any(|v| v == value))
    }
}

/// A storage backend for embedded chunks, partitioned per owner.
///
/// Every operation is scoped to one owner's namespace; namespaces are
/// created implicitly on first use. A query for owner U can only ever
/// observe chunks written under U; this is the tenancy-isolation
/// boundary of the whole pipeline.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Add chunks to `owner`'s namespace.
    ///
    /// The call is all-or-nothing: every chunk is validated before any
    /// is stored.
    ///
    /// # Errors
    ///
    /// - [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch)
    ///   if any embedding's length differs from the index dimensionality.
    /// - [`RagError::DuplicateId`](crate::RagError::DuplicateId) if a
    ///   chunk id repeats within the batch or already exists in the
    ///   namespace. Ids are never silently overwritten.
    async fn add(&self, owner: &str, chunks: &[Chunk]) -> Result<()>;

    /// Return up to `k` chunks from `owner`'s namespace, nearest first.
    ///
    /// Results are ordered by ascending distance; ties resolve to the
    /// earliest-inserted chunk for determinism. An unknown owner yields
    /// an empty result, not an error.
    async fn query(
        &self,
        owner: &str,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredChunk>>;

    /// Remove all chunks in `owner`'s namespace matching `filter`.
    ///
    /// Matching zero entries is a no-op, not an error.
    async fn delete(&self, owner: &str, filter: &MetadataFilter) -> Result<()>;
}
