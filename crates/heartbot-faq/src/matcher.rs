//! Cosine nearest-neighbour lookup over an embedding corpus.

use serde::{Deserialize, Serialize};

/// Best corpus entry for a query vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Position of the best entry in the corpus.
    pub index: usize,
    /// Cosine similarity between the query and that entry, in `[-1.0, 1.0]`.
    pub score: f32,
}

/// Compute the cosine similarity between two equal-length vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` if either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// Find the corpus vector most similar to `query`.
///
/// Ties go to the lowest index. Returns `None` only when `corpus` is empty.
pub fn best_match<V: AsRef<[f32]>>(query: &[f32], corpus: &[V]) -> Option<SimilarityResult> {
    let mut best: Option<SimilarityResult> = None;
    for (index, vector) in corpus.iter().enumerate() {
        let score = cosine_similarity(query, vector.as_ref());
        match best {
            // Strictly greater keeps the first occurrence of the maximum.
            Some(current) if score <= current.score => {}
            _ => best = Some(SimilarityResult { index, score }),
        }
    }
    best
}
