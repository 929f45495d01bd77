//! In-memory vector repository
//!
//! Brute-force implementation of [`VectorRepository`] used by the test
//! suite and for local experiments without a Qdrant server. It evaluates
//! the same compiled [`Filter`] the Qdrant backend receives, so filter
//! translation is exercised end to end.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    condition::ConditionOneOf, r#match::MatchValue, Condition, Filter, Range,
};
use tokio::sync::RwLock;

use skillscope_core::{Competency, DenseVector, Error, Identifier, Result, SparseVector};

use super::{ScoredId, VectorRepository};

struct StoredPoint {
    dense: Vec<f32>,
    sparse: SparseVector,
    payload: serde_json::Value,
    competency: Competency,
}

/// Map-backed repository with linear-scan retrieval.
#[derive(Default)]
pub struct InMemoryRepository {
    points: RwLock<HashMap<Identifier, StoredPoint>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored points.
    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Dot product over shared indices; `None` when no index overlaps.
fn sparse_dot(query: &SparseVector, doc: &SparseVector) -> Option<f32> {
    let weights: HashMap<u32, f32> = query
        .indices
        .iter()
        .copied()
        .zip(query.values.iter().copied())
        .collect();

    let mut overlap = false;
    let mut score = 0.0;
    for (index, value) in doc.indices.iter().zip(doc.values.iter()) {
        if let Some(w) = weights.get(index) {
            overlap = true;
            score += w * value;
        }
    }
    overlap.then_some(score)
}

/// Resolve a dotted path against a payload, descending through arrays of
/// objects at every step (array-any semantics).
fn resolve<'a>(payload: &'a serde_json::Value, path: &str) -> Vec<&'a serde_json::Value> {
    let mut current = vec![payload];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                serde_json::Value::Object(map) => {
                    if let Some(child) = map.get(segment) {
                        next.push(child);
                    }
                }
                serde_json::Value::Array(items) => {
                    for item in items {
                        if let serde_json::Value::Object(map) = item {
                            if let Some(child) = map.get(segment) {
                                next.push(child);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }
    current
}

/// Scalar leaves at a path: terminal arrays contribute each element.
fn leaves<'a>(payload: &'a serde_json::Value, path: &str) -> Vec<&'a serde_json::Value> {
    resolve(payload, path)
        .into_iter()
        .flat_map(|v| match v {
            serde_json::Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

fn leaf_matches(leaf: &serde_json::Value, value: &MatchValue) -> bool {
    match value {
        MatchValue::Keyword(s) => leaf.as_str() == Some(s.as_str()),
        MatchValue::Integer(i) => leaf.as_i64() == Some(*i),
        MatchValue::Boolean(b) => leaf.as_bool() == Some(*b),
        MatchValue::Keywords(set) => leaf
            .as_str()
            .is_some_and(|s| set.strings.iter().any(|k| k == s)),
        MatchValue::Integers(set) => leaf
            .as_i64()
            .is_some_and(|i| set.integers.contains(&i)),
        _ => false,
    }
}

fn leaf_in_range(leaf: &serde_json::Value, range: &Range) -> bool {
    let Some(n) = leaf.as_f64() else {
        return false;
    };
    range.gt.is_none_or(|b| n > b)
        && range.gte.is_none_or(|b| n >= b)
        && range.lt.is_none_or(|b| n < b)
        && range.lte.is_none_or(|b| n <= b)
}

fn is_empty_at(payload: &serde_json::Value, key: &str) -> bool {
    let resolved = resolve(payload, key);
    resolved.iter().all(|v| match v {
        serde_json::Value::Null => true,
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    })
}

fn condition_holds(condition: &Condition, payload: &serde_json::Value) -> bool {
    match &condition.condition_one_of {
        Some(ConditionOneOf::Field(field)) => {
            let values = leaves(payload, &field.key);
            if let Some(ref m) = field.r#match {
                let Some(ref match_value) = m.match_value else {
                    return false;
                };
                return values.iter().any(|leaf| leaf_matches(leaf, match_value));
            }
            if let Some(ref range) = field.range {
                return values.iter().any(|leaf| leaf_in_range(leaf, range));
            }
            false
        }
        Some(ConditionOneOf::IsEmpty(cond)) => is_empty_at(payload, &cond.key),
        Some(ConditionOneOf::Filter(nested)) => filter_holds(nested, payload),
        _ => false,
    }
}

/// Evaluate a compiled filter the way the store would.
fn filter_holds(filter: &Filter, payload: &serde_json::Value) -> bool {
    filter.must.iter().all(|c| condition_holds(c, payload))
        && filter.must_not.iter().all(|c| !condition_holds(c, payload))
}

fn passes(filter: Option<&Filter>, payload: &serde_json::Value) -> bool {
    filter.is_none_or(|f| filter_holds(f, payload))
}

#[async_trait]
impl VectorRepository for InMemoryRepository {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(
        &self,
        identifier: Identifier,
        dense: DenseVector,
        sparse: SparseVector,
        competency: &Competency,
    ) -> Result<()> {
        let payload = serde_json::to_value(competency)
            .map_err(|e| Error::Storage(format!("failed to serialize payload: {e}")))?;

        self.points.write().await.insert(
            identifier,
            StoredPoint {
                dense: dense.0,
                sparse,
                payload,
                competency: competency.clone(),
            },
        );
        Ok(())
    }

    async fn set_payload(&self, identifier: Identifier, competency: &Competency) -> Result<()> {
        let mut points = self.points.write().await;
        let Some(point) = points.get_mut(&identifier) else {
            return Err(Error::Storage(format!(
                "cannot replace payload of unknown point {identifier}"
            )));
        };

        point.payload = serde_json::to_value(competency)
            .map_err(|e| Error::Storage(format!("failed to serialize payload: {e}")))?;
        point.competency = competency.clone();
        Ok(())
    }

    async fn get(&self, identifier: Identifier) -> Result<Option<Competency>> {
        Ok(self
            .points
            .read()
            .await
            .get(&identifier)
            .map(|p| p.competency.clone()))
    }

    async fn get_batch(
        &self,
        identifiers: &[Identifier],
    ) -> Result<HashMap<Identifier, Competency>> {
        let points = self.points.read().await;
        Ok(identifiers
            .iter()
            .filter_map(|id| points.get(id).map(|p| (*id, p.competency.clone())))
            .collect())
    }

    async fn delete(&self, identifier: Identifier) -> Result<()> {
        self.points.write().await.remove(&identifier);
        Ok(())
    }

    async fn query_dense(
        &self,
        vector: DenseVector,
        limit: u64,
        filter: Option<Filter>,
    ) -> Result<Vec<ScoredId>> {
        let points = self.points.read().await;
        let mut hits: Vec<ScoredId> = points
            .iter()
            .filter(|(_, p)| passes(filter.as_ref(), &p.payload))
            .map(|(id, p)| ScoredId {
                identifier: *id,
                score: cosine(vector.values(), &p.dense),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn query_sparse(
        &self,
        vector: SparseVector,
        limit: u64,
        filter: Option<Filter>,
    ) -> Result<Vec<ScoredId>> {
        let points = self.points.read().await;
        let mut hits: Vec<ScoredId> = points
            .iter()
            .filter(|(_, p)| passes(filter.as_ref(), &p.payload))
            .filter_map(|(id, p)| {
                sparse_dot(&vector, &p.sparse).map(|score| ScoredId {
                    identifier: *id,
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        hits.truncate(limit as usize);
        Ok(hits)
    }
}
