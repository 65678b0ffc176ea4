//! Exact nearest-neighbour search over one document's chunk vectors.

use docqa_core::{AppError, AppResult};
use serde::Serialize;

/// A search hit: chunk position and squared Euclidean distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Trait for vector index backends.
///
/// Positions are the insertion order of the vectors and map one-to-one onto
/// the document's chunk list.
pub trait VectorIndex: Send + Sync {
    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality shared by every stored vector.
    fn dimensions(&self) -> usize;

    /// Stored vector at `position`, if any.
    fn vector(&self, position: usize) -> Option<&[f32]>;

    /// Up to `k` nearest vectors, best first.
    ///
    /// Ordered by ascending distance, ties broken by ascending position.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>>;
}

/// Brute-force index over contiguous row-major storage.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimensions: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Build an index from vectors in chunk order.
    ///
    /// # Errors
    /// `EmptyInput` for no vectors; `DimensionMismatch` when lengths differ
    /// or the vectors are zero-dimensional.
    pub fn build(vectors: Vec<Vec<f32>>) -> AppResult<Self> {
        let dimensions = match vectors.first() {
            Some(first) => first.len(),
            None => {
                return Err(AppError::EmptyInput(
                    "cannot build an index from zero vectors".to_string(),
                ))
            }
        };

        if dimensions == 0 {
            return Err(AppError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        let mut data = Vec::with_capacity(dimensions * vectors.len());
        for vector in &vectors {
            if vector.len() != dimensions {
                return Err(AppError::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        Ok(Self { dimensions, data })
    }

    /// Rebuild from raw row-major storage, as read back from disk.
    pub(crate) fn from_raw(dimensions: usize, data: Vec<f32>) -> AppResult<Self> {
        if dimensions == 0 || data.is_empty() || data.len() % dimensions != 0 {
            return Err(AppError::Corrupt(format!(
                "{} floats do not form rows of dimension {}",
                data.len(),
                dimensions
            )));
        }
        Ok(Self { dimensions, data })
    }

    /// Raw row-major storage.
    pub(crate) fn as_raw(&self) -> &[f32] {
        &self.data
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimensions)
    }
}

impl VectorIndex for FlatIndex {
    fn len(&self) -> usize {
        self.data.len() / self.dimensions
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimensions)?;
        self.data.get(start..start + self.dimensions)
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>> {
        if query.len() != self.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .rows()
            .enumerate()
            .map(|(position, row)| Neighbor {
                position,
                distance: squared_l2(query, row),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }
}

/// Squared Euclidean distance. Slices must have equal length.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Cosine similarity in [-1, 1]; 0.0 when either vector has zero norm or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
