//! Cosine-similarity primitives for duplicate detection.

use serde::{Deserialize, Serialize};

use crate::error::EmbedError;

/// Outcome of one similarity comparison. Derived per call, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub similarity: f32,
    pub is_duplicate: bool,
    pub threshold_used: f32,
}

/// Cosine similarity between two equal-length vectors. Returns 0.0 for
/// zero-norm inputs rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, EmbedError> {
    if a.len() != b.len() {
        return Err(EmbedError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}

/// Compare two vectors against a duplicate threshold. The boundary is
/// inclusive: similarity exactly at the threshold is a duplicate.
pub fn check_similarity(
    a: &[f32],
    b: &[f32],
    threshold: f32,
) -> Result<SimilarityResult, EmbedError> {
    let similarity = cosine_similarity(a, b)?;
    Ok(SimilarityResult {
        similarity,
        is_duplicate: similarity >= threshold,
        threshold_used: threshold,
    })
}
