//! Retrieval pipeline with reciprocal rank fusion
//!
//! A search runs through five stages: encode the query (both encodings
//! concurrently in hybrid mode), compile the filter once, retrieve from
//! the dense and/or sparse branch under that shared filter, fuse branch
//! rankings, then hydrate payloads for the surviving identifiers.
//!
//! Fusion is rank-based: each branch contributes `1 / (k + rank)` with
//! 1-based ranks, a candidate absent from a branch contributes nothing
//! from it, and the sum is normalized by the best attainable total
//! `2 / (k + 1)` so hybrid scores always land in `[0, 1]`. Branch-native
//! scores (cosine, term dot product) pass through untouched in the
//! single-branch modes.

use std::collections::HashMap;
use std::sync::Arc;

use qdrant_client::qdrant::Filter;
use tracing::{debug, info};

use skillscope_core::{Error, Identifier, Result, SearchMode, SearchRequest, SearchResult};
use skillscope_config::{SearchSettings, MAX_TOP};

use crate::encoder::TextEncoder;
use crate::store::{FilterTranslator, ScoredId, VectorRepository};

/// One fused candidate with the branch ranks that produced it.
#[derive(Debug, Clone, PartialEq)]
struct FusedCandidate {
    identifier: Identifier,
    score: f32,
    dense_rank: Option<usize>,
    sparse_rank: Option<usize>,
}

/// Fuse two branch rankings with normalized reciprocal rank fusion.
///
/// The output is fully ordered: score descending, ties broken by dense
/// rank, then sparse rank, then identifier, so equal-score candidates
/// come back in a stable order.
fn reciprocal_rank_fusion(dense: &[ScoredId], sparse: &[ScoredId], k: u32) -> Vec<FusedCandidate> {
    let mut dense_ranks: HashMap<Identifier, usize> = HashMap::with_capacity(dense.len());
    for (position, hit) in dense.iter().enumerate() {
        dense_ranks.entry(hit.identifier).or_insert(position + 1);
    }

    let mut sparse_ranks: HashMap<Identifier, usize> = HashMap::with_capacity(sparse.len());
    for (position, hit) in sparse.iter().enumerate() {
        sparse_ranks.entry(hit.identifier).or_insert(position + 1);
    }

    // Union of both branches, dense order first for determinism
    let mut candidates: Vec<Identifier> = Vec::with_capacity(dense.len() + sparse.len());
    for hit in dense.iter().chain(sparse.iter()) {
        if !candidates.contains(&hit.identifier) {
            candidates.push(hit.identifier);
        }
    }

    let k = k as f32;
    let max_attainable = 2.0 / (k + 1.0);

    let mut fused: Vec<FusedCandidate> = candidates
        .into_iter()
        .map(|identifier| {
            let dense_rank = dense_ranks.get(&identifier).copied();
            let sparse_rank = sparse_ranks.get(&identifier).copied();

            let contribution = |rank: Option<usize>| {
                rank.map(|r| 1.0 / (k + r as f32)).unwrap_or(0.0)
            };
            let score = (contribution(dense_rank) + contribution(sparse_rank)) / max_attainable;

            FusedCandidate {
                identifier,
                score,
                dense_rank,
                sparse_rank,
            }
        })
        .collect();

    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.dense_rank
                    .unwrap_or(usize::MAX)
                    .cmp(&b.dense_rank.unwrap_or(usize::MAX))
            })
            .then_with(|| {
                a.sparse_rank
                    .unwrap_or(usize::MAX)
                    .cmp(&b.sparse_rank.unwrap_or(usize::MAX))
            })
            .then_with(|| a.identifier.cmp(&b.identifier))
    });

    fused
}

/// Read-side service: encode, retrieve, fuse, hydrate.
pub struct SearchService {
    encoder: Arc<dyn TextEncoder>,
    repository: Arc<dyn VectorRepository>,
    settings: SearchSettings,
}

impl SearchService {
    pub fn new(
        encoder: Arc<dyn TextEncoder>,
        repository: Arc<dyn VectorRepository>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            encoder,
            repository,
            settings,
        }
    }

    /// Run one search request.
    ///
    /// An empty match set is a normal outcome and comes back as an empty
    /// vector, never an error.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(Error::Validation("search text must not be empty".to_string()));
        }
        if request.top == 0 || request.top > MAX_TOP {
            return Err(Error::Validation(format!(
                "top must be between 1 and {MAX_TOP}, got {}",
                request.top
            )));
        }

        // Compile once so both branches of a hybrid query share the exact
        // same predicate.
        let filter = if request.filters.is_empty() {
            None
        } else {
            Some(FilterTranslator::compile(&request.filters)?)
        };

        info!(mode = %request.mode, top = request.top, "search");

        let results = match request.mode {
            SearchMode::Semantic => self.search_semantic(text, request.top, filter).await?,
            SearchMode::Sparse => self.search_sparse(text, request.top, filter).await?,
            SearchMode::Hybrid => self.search_hybrid(text, request.top, filter).await?,
        };

        debug!(returned = results.len(), "search complete");
        Ok(results)
    }

    async fn search_semantic(
        &self,
        text: &str,
        top: usize,
        filter: Option<Filter>,
    ) -> Result<Vec<SearchResult>> {
        let dense = self.encoder.encode_dense(text).await?;
        let hits = self
            .repository
            .query_dense(dense, top as u64, filter)
            .await?;
        self.hydrate(hits).await
    }

    async fn search_sparse(
        &self,
        text: &str,
        top: usize,
        filter: Option<Filter>,
    ) -> Result<Vec<SearchResult>> {
        let sparse = self.encoder.encode_sparse(text).await?;
        let hits = self
            .repository
            .query_sparse(sparse, top as u64, filter)
            .await?;
        self.hydrate(hits).await
    }

    async fn search_hybrid(
        &self,
        text: &str,
        top: usize,
        filter: Option<Filter>,
    ) -> Result<Vec<SearchResult>> {
        let (dense, sparse) = tokio::try_join!(
            self.encoder.encode_dense(text),
            self.encoder.encode_sparse(text),
        )?;

        // Each branch retrieves deeper than `top` so a candidate strong in
        // only one branch still reaches fusion.
        let depth = (self.settings.oversample_factor * top) as u64;

        let (dense_hits, sparse_hits) = tokio::try_join!(
            self.repository.query_dense(dense, depth, filter.clone()),
            self.repository.query_sparse(sparse, depth, filter),
        )?;

        debug!(
            dense = dense_hits.len(),
            sparse = sparse_hits.len(),
            "branch retrieval complete"
        );

        let mut fused = reciprocal_rank_fusion(&dense_hits, &sparse_hits, self.settings.rrf_k);
        fused.truncate(top);

        self.hydrate(
            fused
                .into_iter()
                .map(|c| ScoredId {
                    identifier: c.identifier,
                    score: c.score,
                })
                .collect(),
        )
        .await
    }

    /// Attach payloads, preserving ranking order. An identifier whose
    /// payload has vanished between retrieval and hydration is dropped
    /// silently rather than failing the whole request.
    async fn hydrate(&self, hits: Vec<ScoredId>) -> Result<Vec<SearchResult>> {
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let identifiers: Vec<Identifier> = hits.iter().map(|h| h.identifier).collect();
        let mut payloads = self.repository.get_batch(&identifiers).await?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                payloads.remove(&hit.identifier).map(|competency| SearchResult {
                    identifier: hit.identifier,
                    competency,
                    score: hit.score,
                })
            })
            .collect())
    }
}
