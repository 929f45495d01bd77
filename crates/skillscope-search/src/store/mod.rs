//! Vector store abstraction
//!
//! One collection holds every competency as a single point carrying a named
//! dense vector, a named sparse vector, and the competency JSON as payload.
//! Retrieval returns identifiers and scores only; payloads are fetched in a
//! separate hydration step so the fusion stage never moves payload bytes.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::Filter;

use skillscope_core::{Competency, DenseVector, Identifier, Result, SparseVector};

mod filter;
mod memory;
mod qdrant_repo;

pub use filter::FilterTranslator;
pub use memory::InMemoryRepository;
pub use qdrant_repo::QdrantRepository;

/// Named vector slot for the dense branch.
pub const DENSE_VECTOR: &str = "dense";

/// Named vector slot for the sparse branch.
pub const SPARSE_VECTOR: &str = "sparse";

/// A retrieval hit before hydration: identifier and branch-native score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredId {
    pub identifier: Identifier,
    pub score: f32,
}

/// Storage contract for the dual-vector collection.
///
/// `upsert` is the only transactional boundary: vectors and payload land
/// atomically or not at all. Query methods take an already-compiled filter
/// so both branches of a hybrid search share the same predicate.
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Create the collection and payload indexes if absent. Idempotent.
    async fn init(&self) -> Result<()>;

    /// Write or replace the point for `identifier`.
    async fn upsert(
        &self,
        identifier: Identifier,
        dense: DenseVector,
        sparse: SparseVector,
        competency: &Competency,
    ) -> Result<()>;

    /// Replace the payload of an existing point, leaving its vectors
    /// untouched. Lets a re-index with unchanged indexed text skip the
    /// encoding round trip entirely.
    async fn set_payload(&self, identifier: Identifier, competency: &Competency) -> Result<()>;

    /// Fetch one payload, `None` if the point does not exist.
    async fn get(&self, identifier: Identifier) -> Result<Option<Competency>>;

    /// Fetch payloads for a batch of identifiers. Missing points are
    /// simply absent from the result map.
    async fn get_batch(
        &self,
        identifiers: &[Identifier],
    ) -> Result<HashMap<Identifier, Competency>>;

    /// Remove the point for `identifier`. Removing an absent point is not
    /// an error at this layer.
    async fn delete(&self, identifier: Identifier) -> Result<()>;

    /// Nearest neighbours in the dense space, scores are cosine similarity.
    async fn query_dense(
        &self,
        vector: DenseVector,
        limit: u64,
        filter: Option<Filter>,
    ) -> Result<Vec<ScoredId>>;

    /// Lexical matches in the sparse space, scores are dot products over
    /// shared term indices. Points sharing no term are not returned.
    async fn query_sparse(
        &self,
        vector: SparseVector,
        limit: u64,
        filter: Option<Filter>,
    ) -> Result<Vec<ScoredId>>;
}
