//! Embedding vector type

use serde::{Deserialize, Serialize};

/// A fixed-length embedding vector
///
/// Embeddings carry no identity beyond their values; two embeddings with the
/// same components are interchangeable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    vector: Vec<f32>,
}

impl Embedding {
    /// Create a new embedding
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }

    /// Get the embedding vector
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// Get the embedding dimensions
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Sum of squared per-dimension differences
///
/// Vectors of different lengths are infinitely far apart.
pub fn squared_euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
