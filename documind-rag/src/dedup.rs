//! Similarity-based deduplication of retrieved passages.
//!
//! Overlapping chunks from the same document (and occasionally across
//! documents) retrieve together; this pass keeps one representative per
//! near-duplicate group, highest score first.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::document::RetrievedPassage;

/// Reject a candidate that shares a document with an accepted passage
/// above this word-set similarity.
pub(crate) const SAME_DOC_SIMILARITY: f32 = 0.7;

/// Reject a candidate above this word-set similarity to any accepted
/// passage, regardless of document.
pub(crate) const CROSS_DOC_SIMILARITY: f32 = 0.9;

/// Hash of the first 100 characters, trimmed and lowercased.
///
/// An advisory shortcut: it only short-circuits exact-prefix repeats of
/// already-accepted passages. Near-duplicates with differing prefixes
/// pass it and are caught by the Jaccard comparison, which is the
/// authoritative check.
fn prefix_fingerprint(content: &str) -> u64 {
    let prefix: String = content.chars().take(100).collect();
    let mut hasher = DefaultHasher::new();
    prefix.trim().to_lowercase().hash(&mut hasher);
    hasher.finish()
}

/// Word-set Jaccard similarity over lowercase whitespace-split tokens.
pub(crate) fn jaccard_similarity(a: &str, b: &str) -> f32 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f32 / union as f32
}

/// Deduplicate passages, returning the accepted list in score-descending
/// order.
///
/// Candidates are visited by descending score (stable, so prior order
/// breaks ties). Each candidate is compared against every passage
/// accepted so far; this is O(n²), which is cheap because the retrieval
/// engine caps the candidate pool.
pub(crate) fn dedupe(mut passages: Vec<RetrievedPassage>) -> Vec<RetrievedPassage> {
    passages.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut accepted: Vec<RetrievedPassage> = Vec::new();
    let mut accepted_fingerprints: HashSet<u64> = HashSet::new();

    for candidate in passages {
        if accepted_fingerprints.contains(&prefix_fingerprint(&candidate.content)) {
            continue;
        }

        let is_duplicate = accepted.iter().any(|existing| {
            let similarity = jaccard_similarity(&candidate.content, &existing.content);
            (candidate.doc_id == existing.doc_id && similarity > SAME_DOC_SIMILARITY)
                || similarity > CROSS_DOC_SIMILARITY
        });

        if !is_duplicate {
            accepted_fingerprints.insert(prefix_fingerprint(&candidate.content));
            accepted.push(candidate);
        }
    }

    accepted
}
