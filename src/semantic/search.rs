//! Cosine-similarity ranking over the document index.
//!
//! A linear scan over every passage: corpora here are hundreds to low
//! thousands of passages, so correctness and determinism win over
//! approximate-nearest-neighbor machinery.

use crate::semantic::index::DocumentIndex;

/// One ranked passage: ordinal id plus similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: u64,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search attempted against an empty index")]
    EmptyIndex,

    #[error("query vector has {got} dimensions, index has {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Cosine similarity between two vectors.
///
/// A zero-norm operand yields 0 rather than a division error: a passage
/// that has no direction is simply dissimilar to everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Rank all passages against the query vector and keep the `top_k` best.
///
/// Results are ordered by descending score; ties break on passage
/// insertion order, so repeated calls return the same ordering. A
/// `top_k` larger than the index clamps to the index size.
pub fn search(
    index: &DocumentIndex,
    query: &[f32],
    top_k: usize,
) -> Result<Vec<SearchHit>, SearchError> {
    if index.is_empty() {
        return Err(SearchError::EmptyIndex);
    }
    if query.len() != index.dimensions() {
        return Err(SearchError::DimensionMismatch {
            expected: index.dimensions(),
            got: query.len(),
        });
    }

    let mut hits: Vec<SearchHit> = index
        .passages()
        .iter()
        .map(|passage| SearchHit {
            id: passage.id,
            score: cosine_similarity(query, &passage.embedding),
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });

    hits.truncate(top_k);
    Ok(hits)
}
