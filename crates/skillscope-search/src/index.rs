//! Indexing pipeline
//!
//! One competency in, one dual-vector point out. The two encodings run
//! concurrently and either failure aborts the write, so a point is never
//! stored with only one vector. The upsert itself is the transactional
//! boundary; there is no partial write to roll back.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use skillscope_core::{Competency, Entity, Error, Identifier, Result};

use crate::encoder::TextEncoder;
use crate::store::VectorRepository;

/// Write-side service: validate, encode, upsert.
pub struct IndexService {
    encoder: Arc<dyn TextEncoder>,
    repository: Arc<dyn VectorRepository>,
}

impl std::fmt::Debug for IndexService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexService").finish_non_exhaustive()
    }
}

impl IndexService {
    /// Build the service, rejecting an encoder whose dense dimension does
    /// not match the store's. This is a deployment fault and must surface
    /// at startup, never per record.
    pub fn new(
        encoder: Arc<dyn TextEncoder>,
        repository: Arc<dyn VectorRepository>,
        store_dimension: u64,
    ) -> Result<Self> {
        if encoder.dimension() != store_dimension {
            return Err(Error::Validation(format!(
                "encoder produces dimension {} but the store expects {}",
                encoder.dimension(),
                store_dimension
            )));
        }
        Ok(Self {
            encoder,
            repository,
        })
    }

    /// Index one competency.
    ///
    /// Passing an existing identifier replaces that point in place, which
    /// is what makes re-imports idempotent; omitting it mints a fresh
    /// UUID. When the indexed text of the replaced point is unchanged the
    /// stored vectors are still valid, so only the payload is rewritten
    /// and both encode calls are skipped.
    pub async fn index(
        &self,
        competency: Competency,
        identifier: Option<Identifier>,
    ) -> Result<Entity> {
        competency.validate()?;

        let text = competency.effective_indexed_text();

        if let Some(identifier) = identifier {
            if let Some(stored) = self.repository.get(identifier).await? {
                if stored.effective_indexed_text() == text {
                    self.repository.set_payload(identifier, &competency).await?;
                    info!(%identifier, code = %competency.code, "payload updated, vectors reused");
                    return Ok(Entity {
                        identifier,
                        competency,
                    });
                }
            }
        }

        debug!(code = %competency.code, "encoding indexed text");
        let (dense, sparse) = tokio::try_join!(
            self.encoder.encode_dense(&text),
            self.encoder.encode_sparse(&text),
        )?;

        let identifier = identifier.unwrap_or_else(Uuid::new_v4);
        self.repository
            .upsert(identifier, dense, sparse, &competency)
            .await?;

        info!(%identifier, code = %competency.code, "competency indexed");
        Ok(Entity {
            identifier,
            competency,
        })
    }

    /// Fetch one indexed competency by identifier.
    pub async fn get(&self, identifier: Identifier) -> Result<Entity> {
        let competency = self
            .repository
            .get(identifier)
            .await?
            .ok_or(Error::NotFound(identifier))?;
        Ok(Entity {
            identifier,
            competency,
        })
    }

    /// Remove one indexed competency by identifier.
    ///
    /// Deleting an identifier that was never indexed is reported as
    /// `NotFound` so callers can distinguish it from a successful removal.
    pub async fn delete(&self, identifier: Identifier) -> Result<()> {
        if self.repository.get(identifier).await?.is_none() {
            return Err(Error::NotFound(identifier));
        }
        self.repository.delete(identifier).await?;
        info!(%identifier, "competency deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::store::InMemoryRepository;
    use crate::testing::HashedEncoder;
    use skillscope_core::{CompetencyType, DenseVector, Language, Provider, SparseVector};

    /// Delegating encoder that counts encode calls.
    struct CountingEncoder {
        inner: HashedEncoder,
        calls: AtomicUsize,
    }

    impl CountingEncoder {
        fn new() -> Self {
            Self {
                inner: HashedEncoder::default(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextEncoder for CountingEncoder {
        async fn encode_dense(&self, text: &str) -> Result<DenseVector> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.encode_dense(text).await
        }

        async fn encode_sparse(&self, text: &str) -> Result<SparseVector> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.encode_sparse(text).await
        }

        fn dimension(&self) -> u64 {
            self.inner.dimension()
        }
    }

    fn competency(code: &str, title: &str) -> Competency {
        Competency {
            code: code.to_string(),
            lang: Language::En,
            kind: CompetencyType::Skill,
            provider: Provider::Esco,
            title: title.to_string(),
            url: None,
            category: None,
            description: None,
            keywords: None,
            indexed_text: None,
            metadata: None,
        }
    }

    fn service() -> IndexService {
        let encoder = Arc::new(HashedEncoder::default());
        let dimension = encoder.dimension();
        IndexService::new(encoder, Arc::new(InMemoryRepository::new()), dimension).unwrap()
    }

    #[test]
    fn test_dimension_mismatch_rejected_at_construction() {
        let encoder = Arc::new(HashedEncoder::default());
        let err =
            IndexService::new(encoder, Arc::new(InMemoryRepository::new()), 4096).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_index_mints_identifier_and_get_round_trips() {
        let service = service();
        let entity = service.index(competency("S-1", "Welding"), None).await.unwrap();

        let fetched = service.get(entity.identifier).await.unwrap();
        assert_eq!(fetched.competency.code, "S-1");
        assert_eq!(fetched.identifier, entity.identifier);
    }

    #[tokio::test]
    async fn test_reindex_with_same_identifier_replaces() {
        let service = service();
        let first = service.index(competency("S-1", "Welding"), None).await.unwrap();
        let second = service
            .index(competency("S-1", "Arc Welding"), Some(first.identifier))
            .await
            .unwrap();

        assert_eq!(first.identifier, second.identifier);
        let fetched = service.get(first.identifier).await.unwrap();
        assert_eq!(fetched.competency.title, "Arc Welding");
    }

    #[tokio::test]
    async fn test_reindex_with_unchanged_text_skips_encoding() {
        let encoder = Arc::new(CountingEncoder::new());
        let dimension = encoder.dimension();
        let service = IndexService::new(
            encoder.clone(),
            Arc::new(InMemoryRepository::new()),
            dimension,
        )
        .unwrap();

        let first = service.index(competency("S-1", "Welding"), None).await.unwrap();
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 2);

        // Same title, so the indexed text is unchanged; only metadata moves
        let mut updated = competency("S-1", "Welding");
        updated.category = Some("Manufacturing".to_string());
        let second = service
            .index(updated, Some(first.identifier))
            .await
            .unwrap();

        assert_eq!(second.identifier, first.identifier);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 2);

        let fetched = service.get(first.identifier).await.unwrap();
        assert_eq!(fetched.competency.category.as_deref(), Some("Manufacturing"));
    }

    #[tokio::test]
    async fn test_reindex_with_changed_text_re_encodes() {
        let encoder = Arc::new(CountingEncoder::new());
        let dimension = encoder.dimension();
        let service = IndexService::new(
            encoder.clone(),
            Arc::new(InMemoryRepository::new()),
            dimension,
        )
        .unwrap();

        let first = service.index(competency("S-1", "Welding"), None).await.unwrap();
        service
            .index(competency("S-1", "Arc Welding"), Some(first.identifier))
            .await
            .unwrap();

        assert_eq!(encoder.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_invalid_competency_rejected() {
        let service = service();
        let err = service.index(competency("", "Welding"), None).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let service = service();
        let id = Uuid::new_v4();
        let err = service.get(id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(found) if found == id));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let service = service();
        let err = service.delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let service = service();
        let entity = service.index(competency("S-1", "Welding"), None).await.unwrap();
        service.delete(entity.identifier).await.unwrap();
        assert!(matches!(
            service.get(entity.identifier).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }
}
