//! In-memory vector index using cosine distance.
//!
//! This module provides [`InMemoryVectorIndex`], a zero-dependency index
//! backed by a `HashMap` of per-owner namespaces protected by a
//! `tokio::sync::RwLock`. Suitable for development, testing, and
//! single-node deployments.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, ScoredChunk};
use crate::error::{RagError, Result};
use crate::index::{MetadataFilter, VectorIndex};

/// One owner's partition: chunks in insertion order plus an id set for
/// duplicate detection.
#[derive(Debug, Default)]
struct Namespace {
    chunks: Vec<Chunk>,
    ids: HashSet<String>,
}

/// An in-memory [`VectorIndex`] using cosine distance for search.
///
/// Storage is `owner → namespace`; a namespace keeps its chunks in
/// insertion order so distance ties resolve deterministically. All
/// operations are async-safe via `tokio::sync::RwLock`; a read started
/// after an `add` completes observes that write.
#[derive(Debug)]
pub struct InMemoryVectorIndex {
    dimensions: usize,
    namespaces: RwLock<HashMap<String, Namespace>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index accepting vectors of the given
    /// dimensionality. The dimensionality is fixed for the index's
    /// lifetime.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, namespaces: RwLock::new(HashMap::new()) }
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Cosine distance between two vectors: `1 - cosine_similarity`.
///
/// A zero-magnitude vector is treated as maximally distant.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn add(&self, owner: &str, chunks: &[Chunk]) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        let namespace = namespaces.entry(owner.to_string()).or_default();

        // Validate the whole batch before touching storage so a failure
        // leaves no partial write behind.
        let mut batch_ids: HashSet<&str> = HashSet::with_capacity(chunks.len());
        for chunk in chunks {
            self.check_dimensions(&chunk.embedding)?;
            if namespace.ids.contains(&chunk.id) || !batch_ids.insert(&chunk.id) {
                return Err(RagError::DuplicateId { id: chunk.id.clone() });
            }
        }

        for chunk in chunks {
            namespace.ids.insert(chunk.id.clone());
            namespace.chunks.push(chunk.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        owner: &str,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredChunk>> {
        self.check_dimensions(embedding)?;

        let namespaces = self.namespaces.read().await;
        let Some(namespace) = namespaces.get(owner) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredChunk> = namespace
            .chunks
            .iter()
            .filter(|chunk| filter.is_none_or(|f| f.matches(&chunk.metadata)))
            .map(|chunk| ScoredChunk {
                chunk: chunk.clone(),
                distance: cosine_distance(&chunk.embedding, embedding),
            })
            .collect();

        // Stable sort over insertion-ordered input: equal distances keep
        // the earliest-inserted chunk first.
        scored.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn delete(&self, owner: &str, filter: &MetadataFilter) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        let Some(namespace) = namespaces.get_mut(owner) else {
            return Ok(());
        };

        let removed: Vec<String> = namespace
            .chunks
            .iter()
            .filter(|chunk| filter.matches(&chunk.metadata))
            .map(|chunk| chunk.id.clone())
            .collect();

        namespace.chunks.retain(|chunk| !filter.matches(&chunk.metadata));
        for id in &removed {
            namespace.ids.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_distance() {
        let v = [0.6, 0.8];
        assert!(cosine_distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_unit_distance() {
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_is_maximally_distant() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }
}
