//! SkillScope Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.skillscope/config.toml`
//! - Local config: `.skillscope/config.toml` (in working directory)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.
//!
//! Validation enforces the engine's single fatal startup invariant: the
//! dense dimension produced by the encoder must equal the dimension the
//! vector store was created with. A mismatch is rejected here, never at
//! per-record indexing time.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};

/// Default RRF smoothing constant (the conventional literature value)
pub const DEFAULT_RRF_K: u32 = 60;

/// Default per-branch oversampling multiplier for hybrid retrieval
pub const DEFAULT_OVERSAMPLE_FACTOR: usize = 3;

/// Upper bound on a request's `top`, matching the public API contract
pub const MAX_TOP: usize = 100;

/// Root configuration for the engine.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Vector store configuration
    pub qdrant: QdrantSettings,

    /// Encoding service configuration
    pub encoding: EncodingSettings,

    /// Search tuning knobs
    pub search: SearchSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Qdrant vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantSettings {
    /// Qdrant server URL (gRPC port)
    pub url: String,

    /// API key for authentication (optional)
    pub api_key: Option<String>,

    /// Collection holding the dual-vector points
    pub collection: String,

    /// Dense vector dimension the collection is created with
    pub vector_dimension: u64,

    /// Distance metric, fixed at collection creation time.
    /// Must match the convention the dense encoder is trained for.
    pub distance: DistanceMetric,

    /// Request timeout in seconds (bounds every store call)
    pub timeout_secs: u64,
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "competencies".to_string(),
            vector_dimension: 1024,
            distance: DistanceMetric::Cosine,
            timeout_secs: 30,
        }
    }
}

/// Distance metric of the dense vector space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity (default; what normalized sentence encoders assume)
    #[default]
    Cosine,
    /// Dot product
    Dot,
    /// Euclidean distance
    Euclid,
}

/// Encoding service settings.
///
/// The engine consumes encoding over HTTP from a text-embeddings-inference
/// style server exposing `/embed` and `/embed_sparse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingSettings {
    /// Base URL of the embedding server
    pub url: String,

    /// API key (optional)
    pub api_key: Option<String>,

    /// Dense dimension the configured model produces
    pub vector_dimension: u64,

    /// Request timeout in seconds (bounds every encode call)
    pub timeout_secs: u64,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            api_key: None,
            vector_dimension: 1024,
            timeout_secs: 30,
        }
    }
}

/// Search tuning knobs. Engine-wide, never per-request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Per-branch retrieval depth multiplier for hybrid mode:
    /// each branch fetches `oversample_factor * top` candidates.
    pub oversample_factor: usize,

    /// RRF smoothing constant `k` in `1 / (k + rank)`
    pub rrf_k: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            oversample_factor: DEFAULT_OVERSAMPLE_FACTOR,
            rrf_k: DEFAULT_RRF_K,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override Qdrant URL
    pub qdrant_url: Option<String>,

    /// Override collection name
    pub collection: Option<String>,

    /// Override encoding server URL
    pub encoding_url: Option<String>,

    /// Override log level
    pub log_level: Option<String>,
}

impl EngineConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref url) = overrides.qdrant_url {
            self.qdrant.url = url.clone();
        }

        if let Some(ref collection) = overrides.collection {
            self.qdrant.collection = collection.clone();
        }

        if let Some(ref url) = overrides.encoding_url {
            self.encoding.url = url.clone();
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    ///
    /// The dense-dimension consistency check lives here so a mismatch is a
    /// fatal startup error rather than a per-record runtime error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encoding.vector_dimension != self.qdrant.vector_dimension {
            return Err(ConfigError::Validation(format!(
                "vector dimension mismatch: encoding.vector_dimension ({}) must match \
                 qdrant.vector_dimension ({})",
                self.encoding.vector_dimension, self.qdrant.vector_dimension
            )));
        }
        if self.qdrant.vector_dimension == 0 {
            return Err(ConfigError::Validation(
                "qdrant.vector_dimension must be positive".to_string(),
            ));
        }
        if self.search.oversample_factor == 0 {
            return Err(ConfigError::Validation(
                "search.oversample_factor must be at least 1".to_string(),
            ));
        }
        if self.search.rrf_k == 0 {
            return Err(ConfigError::Validation(
                "search.rrf_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
