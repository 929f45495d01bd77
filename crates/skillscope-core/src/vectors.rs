//! Encoder output value types
//!
//! The engine never interprets vector contents; it only moves them between
//! the encoding service and the vector repository. Dimensionality of dense
//! vectors is fixed store-wide and checked once at startup.

use serde::{Deserialize, Serialize};

/// Fixed-length numeric embedding capturing semantic meaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseVector(pub Vec<f32>);

impl DenseVector {
    /// Number of dimensions
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw values
    pub fn values(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for DenseVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// High-dimensional, mostly-zero weighted term vector
///
/// `indices` and `values` are parallel arrays; entries are coalesced (no
/// duplicate index).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    /// Number of non-zero terms
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_len() {
        let v = DenseVector(vec![0.1, 0.2, 0.3]);
        assert_eq!(v.len(), 3);
        assert!(!v.is_empty());
    }

    #[test]
    fn test_sparse_len() {
        let v = SparseVector {
            indices: vec![7, 42],
            values: vec![0.5, 1.5],
        };
        assert_eq!(v.len(), 2);
        assert!(!v.is_empty());
    }
}
