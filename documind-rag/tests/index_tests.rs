//! Contract and property tests for the in-memory vector index.

use std::collections::HashMap;

use documind_rag::{Chunk, InMemoryVectorIndex, MetadataFilter, RagError, VectorIndex};
use proptest::prelude::*;

fn chunk(id: &str, doc_id: &str, owner: &str, embedding: Vec<f32>) -> Chunk {
    let mut metadata = HashMap::new();
    metadata.insert("doc_id".to_string(), doc_id.to_string());
    Chunk {
        id: id.to_string(),
        text: format!("text of {id}"),
        embedding,
        doc_id: doc_id.to_string(),
        owner: owner.to_string(),
        metadata,
    }
}

#[tokio::test]
async fn read_after_write_observes_the_write() {
    let index = InMemoryVectorIndex::new(2);
    index.add("alice", &[chunk("c1", "d1", "alice", vec![1.0, 0.0])]).await.unwrap();

    let results = index.query("alice", &[1.0, 0.0], 5, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.id, "c1");
    assert!(results[0].distance.abs() < 1e-6);
}

#[tokio::test]
async fn unknown_owner_queries_empty() {
    let index = InMemoryVectorIndex::new(2);
    let results = index.query("nobody", &[1.0, 0.0], 5, None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn duplicate_id_across_calls_is_rejected_without_overwrite() {
    let index = InMemoryVectorIndex::new(2);
    index.add("alice", &[chunk("c1", "d1", "alice", vec![1.0, 0.0])]).await.unwrap();

    let result = index.add("alice", &[chunk("c1", "d2", "alice", vec![0.0, 1.0])]).await;
    assert!(matches!(result, Err(RagError::DuplicateId { .. })));

    // The original entry is untouched.
    let results = index.query("alice", &[1.0, 0.0], 5, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.doc_id, "d1");
}

#[tokio::test]
async fn duplicate_id_within_a_batch_stores_nothing() {
    let index = InMemoryVectorIndex::new(2);
    let result = index
        .add(
            "alice",
            &[
                chunk("c1", "d1", "alice", vec![1.0, 0.0]),
                chunk("c1", "d1", "alice", vec![0.0, 1.0]),
            ],
        )
        .await;

    assert!(matches!(result, Err(RagError::DuplicateId { .. })));
    let results = index.query("alice", &[1.0, 0.0], 5, None).await.unwrap();
    assert!(results.is_empty(), "failed batch must leave no partial write");
}

#[tokio::test]
async fn same_id_in_different_namespaces_is_allowed() {
    let index = InMemoryVectorIndex::new(2);
    index.add("alice", &[chunk("c1", "d1", "alice", vec![1.0, 0.0])]).await.unwrap();
    index.add("bob", &[chunk("c1", "d1", "bob", vec![1.0, 0.0])]).await.unwrap();
}

#[tokio::test]
async fn mismatched_dimensions_are_rejected() {
    let index = InMemoryVectorIndex::new(3);

    let add = index.add("alice", &[chunk("c1", "d1", "alice", vec![1.0, 0.0])]).await;
    assert!(matches!(add, Err(RagError::DimensionMismatch { expected: 3, actual: 2 })));

    let query = index.query("alice", &[1.0, 0.0], 5, None).await;
    assert!(matches!(query, Err(RagError::DimensionMismatch { .. })));
}

#[tokio::test]
async fn namespaces_are_isolated() {
    let index = InMemoryVectorIndex::new(2);
    index.add("alice", &[chunk("c1", "d1", "alice", vec![1.0, 0.0])]).await.unwrap();

    let results = index.query("bob", &[1.0, 0.0], 5, None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn metadata_filter_restricts_results() {
    let index = InMemoryVectorIndex::new(2);
    index
        .add(
            "alice",
            &[
                chunk("c1", "d1", "alice", vec![1.0, 0.0]),
                chunk("c2", "d2", "alice", vec![1.0, 0.0]),
            ],
        )
        .await
        .unwrap();

    let filter = MetadataFilter::key_in("doc_id", ["d2"]);
    let results = index.query("alice", &[1.0, 0.0], 5, Some(&filter)).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.id, "c2");
}

#[tokio::test]
async fn delete_removes_only_matching_chunks() {
    let index = InMemoryVectorIndex::new(2);
    index
        .add(
            "alice",
            &[
                chunk("c1", "d1", "alice", vec![1.0, 0.0]),
                chunk("c2", "d2", "alice", vec![0.0, 1.0]),
            ],
        )
        .await
        .unwrap();

    index.delete("alice", &MetadataFilter::key_eq("doc_id", "d1")).await.unwrap();

    let results = index.query("alice", &[1.0, 0.0], 5, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.doc_id, "d2");

    // Deleting with a filter matching nothing is a no-op.
    index.delete("alice", &MetadataFilter::key_eq("doc_id", "ghost")).await.unwrap();
    index.delete("nobody", &MetadataFilter::key_eq("doc_id", "d1")).await.unwrap();
}

#[tokio::test]
async fn deleted_ids_can_be_reingested() {
    let index = InMemoryVectorIndex::new(2);
    index.add("alice", &[chunk("c1", "d1", "alice", vec![1.0, 0.0])]).await.unwrap();
    index.delete("alice", &MetadataFilter::key_eq("doc_id", "d1")).await.unwrap();

    index.add("alice", &[chunk("c1", "d1", "alice", vec![0.0, 1.0])]).await.unwrap();
}

#[tokio::test]
async fn distance_ties_resolve_to_insertion_order() {
    let index = InMemoryVectorIndex::new(2);
    index
        .add(
            "alice",
            &[
                chunk("first", "d1", "alice", vec![1.0, 0.0]),
                chunk("second", "d1", "alice", vec![1.0, 0.0]),
            ],
        )
        .await
        .unwrap();

    let results = index.query("alice", &[1.0, 0.0], 2, None).await.unwrap();
    assert_eq!(results[0].chunk.id, "first");
    assert_eq!(results[1].chunk.id, "second");
}

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-8 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

/// *For any* set of uniquely-identified chunks in one namespace, a query
/// returns results ordered by ascending distance, bounded by `k`, and
/// never from another namespace.
mod prop_query_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ascend_by_distance_and_respect_k(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, stored) = rt.block_on(async {
                let index = InMemoryVectorIndex::new(DIM);
                let chunks: Vec<Chunk> = embeddings
                    .iter()
                    .enumerate()
                    .map(|(i, e)| chunk(&format!("c{i}"), "d1", "alice", e.clone()))
                    .collect();

                index.add("alice", &chunks).await.unwrap();
                let results = index.query("alice", &query, k, None).await.unwrap();
                (results, chunks.len())
            });

            prop_assert!(results.len() <= k);
            prop_assert!(results.len() <= stored);

            for window in results.windows(2) {
                prop_assert!(
                    window[0].distance <= window[1].distance,
                    "results not in ascending order: {} > {}",
                    window[0].distance,
                    window[1].distance,
                );
            }
        }
    }
}
