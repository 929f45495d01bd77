//! Deterministic encoder for tests and offline experiments
//!
//! Hashed bag-of-words stands in for a real embedding model: tokens are
//! FNV-hashed into a small dense vector and into sparse term indices, so
//! texts sharing a token land close in both spaces without any network
//! dependency. Scores are meaningful only relative to each other.

use std::collections::BTreeMap;

use async_trait::async_trait;

use skillscope_core::{DenseVector, Result, SparseVector};

use crate::encoder::TextEncoder;

const DEFAULT_DIMENSION: usize = 16;

fn fnv1a(token: &str) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for byte in token.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Lowercased whitespace tokens, stripped of surrounding punctuation.
/// Internal hyphens survive, so codes like `ESCO-S123` stay one token.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Hashed bag-of-words encoder.
pub struct HashedEncoder {
    dimension: usize,
}

impl Default for HashedEncoder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl HashedEncoder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl TextEncoder for HashedEncoder {
    async fn encode_dense(&self, text: &str) -> Result<DenseVector> {
        let mut values = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let bucket = fnv1a(&token) as usize % self.dimension;
            values[bucket] += 1.0;
        }

        let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut values {
                *v /= norm;
            }
        }
        Ok(DenseVector(values))
    }

    async fn encode_sparse(&self, text: &str) -> Result<SparseVector> {
        let mut terms: BTreeMap<u32, f32> = BTreeMap::new();
        for token in tokenize(text) {
            *terms.entry(fnv1a(&token)).or_insert(0.0) += 1.0;
        }

        let (indices, values): (Vec<u32>, Vec<f32>) = terms.into_iter().unzip();
        Ok(SparseVector { indices, values })
    }

    fn dimension(&self) -> u64 {
        self.dimension as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dense_is_unit_length() {
        let encoder = HashedEncoder::default();
        let v = encoder.encode_dense("python programming").await.unwrap();
        let norm: f32 = v.values().iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_shared_token_shares_sparse_index() {
        let encoder = HashedEncoder::default();
        let a = encoder.encode_sparse("Python Programming").await.unwrap();
        let b = encoder.encode_sparse("programming").await.unwrap();
        assert!(a.indices.iter().any(|i| b.indices.contains(i)));
    }

    #[test]
    fn test_hyphenated_code_is_one_token() {
        assert_eq!(tokenize("certified ESCO-S123."), vec!["certified", "esco-s123"]);
    }

    #[tokio::test]
    async fn test_empty_text_encodes_to_zero_vectors() {
        let encoder = HashedEncoder::default();
        let dense = encoder.encode_dense("").await.unwrap();
        assert!(dense.values().iter().all(|v| *v == 0.0));
        let sparse = encoder.encode_sparse("").await.unwrap();
        assert!(sparse.is_empty());
    }
}
