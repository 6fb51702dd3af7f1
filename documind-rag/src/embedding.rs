//! Embedding provider trait and the lazy one-time-initialization holder.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend behind a unified
/// async interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends with native batching should override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of texts, one vector per
    /// input, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

type ProviderFactory = Box<dyn Fn() -> Result<Arc<dyn EmbeddingProvider>> + Send + Sync>;

/// An [`EmbeddingProvider`] that defers backend construction to first use.
///
/// The factory runs at most once per instance, even under concurrent
/// first use; callers racing on initialization all wait for the single
/// in-flight attempt. A failed load is cached as fatal: every later call
/// fails with [`RagError::ModelUnavailable`] without re-running the
/// factory, since a model that failed to load (missing weights, OOM)
/// will not heal per-request.
///
/// Construct one handle at composition time and share it; this replaces
/// a process-global model singleton with an injectable service object.
pub struct LazyEmbedder {
    dimensions: usize,
    factory: ProviderFactory,
    cell: OnceCell<std::result::Result<Arc<dyn EmbeddingProvider>, String>>,
}

impl LazyEmbedder {
    /// Create a lazy embedder around a provider factory.
    ///
    /// `dimensions` is the dimensionality the factory's provider is
    /// expected to produce; it is available before (and without)
    /// initialization, and a provider reporting a different value is
    /// rejected at load time.
    pub fn new<F>(dimensions: usize, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn EmbeddingProvider>> + Send + Sync + 'static,
    {
        Self { dimensions, factory: Box::new(factory), cell: OnceCell::new() }
    }

    async fn provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let slot = self
            .cell
            .get_or_init(|| async {
                info!("loading embedding model");
                match (self.factory)() {
                    Ok(provider) if provider.dimensions() != self.dimensions => {
                        let message = format!(
                            "provider reports {} dimensions, expected {}",
                            provider.dimensions(),
                            self.dimensions
                        );
                        error!(%message, "embedding model rejected");
                        Err(message)
                    }
                    Ok(provider) => {
                        info!(dimensions = self.dimensions, "embedding model loaded");
                        Ok(provider)
                    }
                    Err(e) => {
                        error!(error = %e, "embedding model failed to load");
                        Err(e.to_string())
                    }
                }
            })
            .await;

        match slot {
            Ok(provider) => Ok(Arc::clone(provider)),
            Err(message) => Err(RagError::ModelUnavailable(message.clone())),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for LazyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.provider().await?.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.provider().await?.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct StubProvider {
        dimensions: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for StubProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; self.dimensions])
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    #[tokio::test]
    async fn concurrent_first_use_loads_once() {
        static LOADS: AtomicUsize = AtomicUsize::new(0);

        let embedder = Arc::new(LazyEmbedder::new(4, || {
            LOADS.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubProvider { dimensions: 4 }) as Arc<dyn EmbeddingProvider>)
        }));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let embedder = Arc::clone(&embedder);
                tokio::spawn(async move { embedder.embed("hello").await })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert_eq!(LOADS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_cached_as_fatal() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let embedder = LazyEmbedder::new(4, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(RagError::Backend { backend: "weights".into(), message: "missing file".into() })
        });

        assert!(matches!(embedder.embed("a").await, Err(RagError::ModelUnavailable(_))));
        assert!(matches!(embedder.embed("b").await, Err(RagError::ModelUnavailable(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mismatched_dimensions_are_rejected_at_load() {
        let embedder = LazyEmbedder::new(8, || {
            Ok(Arc::new(StubProvider { dimensions: 4 }) as Arc<dyn EmbeddingProvider>)
        });

        assert!(matches!(embedder.embed("a").await, Err(RagError::ModelUnavailable(_))));
    }
}
