//! SkillScope Core - Domain model for the competency retrieval engine
//!
//! This crate defines the canonical types shared by the indexing and search
//! services:
//!
//! - [`Competency`] - the canonical skill/occupation/certification record
//! - [`FilterSpec`] - the generic, conjunction-only filter specification
//! - [`DenseVector`] / [`SparseVector`] - encoder output value types
//! - [`SearchRequest`] / [`SearchResult`] - search inputs and ephemeral outputs
//! - [`Error`] - the engine-wide error taxonomy with retryability semantics
//! - [`CompetencyMapper`] / [`MapperRegistry`] - the external adapter contract
//!
//! The crate is deliberately free of any storage or model dependency; the
//! engine consumes encoding and storage through contracts defined in
//! `skillscope-search`.

pub mod competency;
pub mod error;
pub mod filters;
pub mod mapper;
pub mod search;
pub mod vectors;

// Re-exports for convenience
pub use competency::{Competency, CompetencyType, Language, Provider};
pub use error::{Error, Result};
pub use filters::{FilterOperator, FilterSpec};
pub use mapper::{CompetencyMapper, MapperFactory, MapperRegistry};
pub use search::{Entity, SearchMode, SearchRequest, SearchResult};
pub use vectors::{DenseVector, SparseVector};

/// Opaque unique key of an indexed entity.
///
/// Assigned once at first index (a fresh v4 UUID unless the caller supplies
/// one) and immutable thereafter.
pub type Identifier = uuid::Uuid;
