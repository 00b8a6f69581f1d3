//! Flat vector index for exact nearest-neighbor search.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{KagamiError, Result};
use crate::vector::{DistanceMetric, Vector};

/// An in-memory flat index over fixed-dimension vectors.
///
/// Search is a brute-force linear scan over all stored vectors: exact, simple
/// and fast enough for the dataset sizes this service targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatVectorIndex {
    dimension: usize,
    metric: DistanceMetric,
    vectors: Vec<Vec<f32>>,
}

impl FlatVectorIndex {
    /// Create a new empty index for vectors of the given dimension.
    pub fn new(dimension: usize, metric: DistanceMetric) -> Result<Self> {
        if dimension == 0 {
            return Err(KagamiError::invalid_argument(
                "index dimension must be greater than 0",
            ));
        }
        Ok(Self {
            dimension,
            metric,
            vectors: Vec::new(),
        })
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimension of the stored vectors.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Distance metric used for search.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Validate a vector before it enters the index.
    fn validate_vector(&self, vector: &Vector) -> Result<()> {
        vector.validate_dimension(self.dimension)?;
        if !vector.is_valid() {
            return Err(KagamiError::InvalidOperation(
                "Vector contains invalid values (NaN or infinity)".to_string(),
            ));
        }
        Ok(())
    }

    /// Append a single vector, returning its slot id.
    pub fn add_vector(&mut self, vector: Vector) -> Result<usize> {
        self.validate_vector(&vector)?;
        self.vectors.push(vector.data);
        Ok(self.vectors.len() - 1)
    }

    /// Append a batch of vectors.
    ///
    /// The whole batch is validated before any vector is added, so a failed
    /// call leaves the index unchanged.
    pub fn add_vectors(&mut self, vectors: Vec<Vector>) -> Result<()> {
        for vector in &vectors {
            self.validate_vector(vector)?;
        }
        self.vectors
            .extend(vectors.into_iter().map(|vector| vector.data));
        Ok(())
    }

    /// Find the `k` nearest stored vectors to the query.
    ///
    /// Returns `(slot id, distance)` pairs in ascending distance order, ties
    /// broken by slot id. `k` is clamped to the number of stored vectors.
    pub fn search(&self, query: &Vector, k: usize) -> Result<Vec<(usize, f32)>> {
        self.validate_vector(query)?;

        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let candidates: Vec<&[f32]> = self.vectors.iter().map(|v| v.as_slice()).collect();
        let distances = self.metric.batch_distance(&query.data, &candidates)?;

        let mut results: Vec<(usize, f32)> = distances.into_iter().enumerate().collect();
        results.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        results.truncate(k.min(self.vectors.len()));

        Ok(results)
    }

    /// Serialize this index to an opaque byte blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| KagamiError::serialization(e.to_string()))
    }

    /// Deserialize an index from a byte blob produced by [`Self::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (index, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| KagamiError::serialization(e.to_string()))?;
        Ok(index)
    }
}
