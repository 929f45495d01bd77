//! SkillScope Search - hybrid retrieval engine for competency taxonomies
//!
//! Every competency is stored as one point with two named vectors: a dense
//! semantic embedding and a sparse lexical one. Search runs either branch
//! alone or both concurrently, fusing rankings with normalized reciprocal
//! rank fusion.
//!
//! The crate is organised around two contracts:
//!
//! - [`TextEncoder`] - dual encoding, consumed over HTTP in production
//!   ([`HttpEncoder`]) and deterministic in tests ([`testing::HashedEncoder`])
//! - [`VectorRepository`] - the dual-vector collection, backed by Qdrant
//!   ([`QdrantRepository`]) or memory ([`InMemoryRepository`])
//!
//! [`IndexService`] owns the write path, [`SearchService`] the read path,
//! and [`AppContext`] wires both to a validated configuration.

pub mod context;
pub mod encoder;
pub mod hybrid;
pub mod index;
pub mod store;
pub mod testing;

pub use context::AppContext;
pub use encoder::{HttpEncoder, TextEncoder};
pub use hybrid::SearchService;
pub use index::IndexService;
pub use store::{
    FilterTranslator, InMemoryRepository, QdrantRepository, ScoredId, VectorRepository,
};
