//! Wiring of configuration, encoder, store and services
//!
//! Built once at process start and shared for the process lifetime.
//! Connections are released by dropping the context; there is no explicit
//! shutdown step.

use std::sync::Arc;

use skillscope_core::Result;
use skillscope_config::EngineConfig;

use crate::encoder::{HttpEncoder, TextEncoder};
use crate::hybrid::SearchService;
use crate::index::IndexService;
use crate::store::{QdrantRepository, VectorRepository};

/// Shared application state: configuration plus the two services.
pub struct AppContext {
    pub config: EngineConfig,
    repository: Arc<dyn VectorRepository>,
    pub index: IndexService,
    pub search: SearchService,
}

impl AppContext {
    /// Connect to the configured Qdrant server and embedding service.
    ///
    /// The configuration is expected to be validated already; the index
    /// service re-checks the dimension invariant as a second line of
    /// defence.
    pub async fn connect(config: EngineConfig) -> Result<Self> {
        let encoder: Arc<dyn TextEncoder> = Arc::new(HttpEncoder::new(&config.encoding)?);
        let repository: Arc<dyn VectorRepository> =
            Arc::new(QdrantRepository::connect(&config.qdrant).await?);
        repository.init().await?;
        Self::from_parts(config, encoder, repository)
    }

    /// Assemble a context from pre-built components.
    pub fn from_parts(
        config: EngineConfig,
        encoder: Arc<dyn TextEncoder>,
        repository: Arc<dyn VectorRepository>,
    ) -> Result<Self> {
        let index = IndexService::new(
            encoder.clone(),
            repository.clone(),
            config.qdrant.vector_dimension,
        )?;
        let search = SearchService::new(encoder, repository.clone(), config.search.clone());

        Ok(Self {
            config,
            repository,
            index,
            search,
        })
    }

    /// Create the collection and its payload indexes if absent.
    pub async fn init_store(&self) -> Result<()> {
        self.repository.init().await
    }
}
