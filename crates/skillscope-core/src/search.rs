//! Search request and result types
//!
//! A [`SearchResult`] is ephemeral: it is never persisted and carries a
//! point-in-time snapshot of the stored competency next to a score whose
//! semantics depend on the search mode.

use serde::{Deserialize, Serialize};

use crate::competency::Competency;
use crate::filters::FilterSpec;
use crate::Identifier;

/// Retrieval strategy of a search request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Dense retrieval only; scores are cosine similarities in [-1, 1]
    #[default]
    Semantic,
    /// Sparse retrieval only; scores are unbounded keyword-relevance scores
    Sparse,
    /// Dual retrieval fused with RRF; scores are normalized into [0, 1]
    Hybrid,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Semantic => write!(f, "semantic"),
            SearchMode::Sparse => write!(f, "sparse"),
            SearchMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Search request wire shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text to encode
    pub text: String,
    /// Retrieval strategy
    #[serde(default, rename = "search_type")]
    pub mode: SearchMode,
    /// Maximum number of results
    #[serde(default = "default_top")]
    pub top: usize,
    /// Conjunctive filter conditions
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

fn default_top() -> usize {
    10
}

impl SearchRequest {
    /// Build a request with default top and no filters
    pub fn new(text: impl Into<String>, mode: SearchMode) -> Self {
        Self {
            text: text.into(),
            mode,
            top: default_top(),
            filters: Vec::new(),
        }
    }

    /// Set the result count
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    /// Set the filter conditions
    pub fn with_filters(mut self, filters: Vec<FilterSpec>) -> Self {
        self.filters = filters;
        self
    }
}

/// An indexed entity: identifier plus competency snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub identifier: Identifier,
    pub competency: Competency,
}

/// A single ranked search hit. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub identifier: Identifier,
    pub competency: Competency,
    /// Score semantics depend on the request's [`SearchMode`]
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req: SearchRequest =
            serde_json::from_value(serde_json::json!({"text": "programming"})).unwrap();
        assert_eq!(req.mode, SearchMode::Semantic);
        assert_eq!(req.top, 10);
        assert!(req.filters.is_empty());
    }

    #[test]
    fn test_request_wire_shape() {
        let req: SearchRequest = serde_json::from_value(serde_json::json!({
            "text": "programming",
            "search_type": "hybrid",
            "top": 2,
            "filters": [{"field": "lang", "operator": "eq", "value": "en"}],
        }))
        .unwrap();
        assert_eq!(req.mode, SearchMode::Hybrid);
        assert_eq!(req.top, 2);
        assert_eq!(req.filters.len(), 1);
    }
}
