//! Shared test doubles for integration tests.

#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use documind_rag::{EmbeddingProvider, Result};

/// Dimensionality of [`HashEmbedder`] vectors.
pub const DIM: usize = 256;

/// A deterministic local embedder: a hashed character-trigram bag,
/// L2-normalized. Identical texts embed identically (distance 0);
/// texts sharing no trigrams are orthogonal. No model, no network.
pub struct HashEmbedder;

pub fn embed_text(text: &str) -> Vec<f32> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let mut vector = vec![0.0f32; DIM];

    if chars.len() < 3 {
        let mut hasher = DefaultHasher::new();
        text.to_lowercase().hash(&mut hasher);
        vector[(hasher.finish() as usize) % DIM] = 1.0;
        return vector;
    }

    for window in chars.windows(3) {
        let mut hasher = DefaultHasher::new();
        window.hash(&mut hasher);
        vector[(hasher.finish() as usize) % DIM] += 1.0;
    }

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(embed_text(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Deterministic whitespace-free filler, distinct across positions.
pub fn filler(len: usize) -> String {
    (0..len).map(|i| char::from(b'a' + ((i * 7 + i / 26) % 26) as u8)).collect()
}
