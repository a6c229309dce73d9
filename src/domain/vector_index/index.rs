//! Flat squared-L2 index

use std::cmp::Ordering;

use tracing::debug;

use crate::domain::embedding::{squared_euclidean_distance, Embedding};
use crate::domain::DomainError;

/// A search hit: ordinal position of a stored vector and its squared distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub ordinal: usize,
    pub distance: f32,
}

impl Neighbor {
    pub fn new(ordinal: usize, distance: f32) -> Self {
        Self { ordinal, distance }
    }

    /// Ascending distance, ties broken by ascending ordinal
    fn rank(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.ordinal.cmp(&other.ordinal))
    }
}

/// Exact nearest-neighbour index over squared Euclidean distance
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimensions: usize,
    vectors: Vec<Embedding>,
    /// Row-major copy of `vectors`, rebuilt on every `add`
    matrix: Vec<f32>,
}

impl VectorIndex {
    /// Create an empty index for vectors of the given dimensionality
    pub fn new(dimensions: usize) -> Result<Self, DomainError> {
        if dimensions == 0 {
            return Err(DomainError::invalid_dimension(dimensions));
        }

        Ok(Self {
            dimensions,
            vectors: Vec::new(),
            matrix: Vec::new(),
        })
    }

    /// Get the fixed dimensionality
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Get the stored vector at an ordinal
    pub fn get(&self, ordinal: usize) -> Option<&Embedding> {
        self.vectors.get(ordinal)
    }

    /// Append embeddings in order, extending the ordinal range
    ///
    /// Every embedding is validated before anything is stored, so a rejected
    /// batch leaves the index unchanged.
    pub fn add(&mut self, embeddings: Vec<Embedding>) -> Result<(), DomainError> {
        if let Some(bad) = embeddings
            .iter()
            .find(|embedding| embedding.dimensions() != self.dimensions)
        {
            return Err(DomainError::dimension_mismatch(
                self.dimensions,
                bad.dimensions(),
            ));
        }

        if embeddings.is_empty() {
            return Ok(());
        }

        self.vectors.extend(embeddings);
        self.rebuild();

        Ok(())
    }

    /// Find the `k` stored vectors closest to `query`
    ///
    /// Returns at most `min(k, len)` neighbours sorted by ascending squared
    /// distance. An empty index yields no neighbours rather than an error.
    pub fn search(&self, query: &Embedding, k: usize) -> Result<Vec<Neighbor>, DomainError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.dimensions() != self.dimensions {
            return Err(DomainError::dimension_mismatch(
                self.dimensions,
                query.dimensions(),
            ));
        }

        let mut neighbors: Vec<Neighbor> = self
            .matrix
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(ordinal, row)| {
                Neighbor::new(ordinal, squared_euclidean_distance(query.vector(), row))
            })
            .collect();

        neighbors.sort_by(Neighbor::rank);
        neighbors.truncate(k);

        Ok(neighbors)
    }

    fn rebuild(&mut self) {
        let mut matrix = Vec::with_capacity(self.vectors.len() * self.dimensions);

        for embedding in &self.vectors {
            matrix.extend_from_slice(embedding.vector());
        }

        self.matrix = matrix;

        debug!(
            vectors = self.vectors.len(),
            dimensions = self.dimensions,
            "Rebuilt vector index"
        );
    }
}
