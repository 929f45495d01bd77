//! Provider adapter contract and registry
//!
//! Each external taxonomy format is adapted to the canonical [`Competency`]
//! by a mapper implementing [`CompetencyMapper`]. The engine never inspects
//! a concrete mapper; the import orchestrator selects one through a
//! provider-keyed [`MapperRegistry`] populated once at process start.
//! Dispatch is by explicit [`Provider`] tag, never by runtime type
//! inspection.

use std::collections::HashMap;

use crate::competency::{Competency, Provider};
use crate::error::{Error, Result};

/// One-method translation from a raw source record to the canonical entity
pub trait CompetencyMapper: Send + Sync {
    /// Convert the raw data to a [`Competency`] with cleaned fields
    fn to_competency(&self) -> Result<Competency>;
}

impl std::fmt::Debug for dyn CompetencyMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn CompetencyMapper")
    }
}

/// Constructor for a mapper over one raw record
pub type MapperFactory = fn(&serde_json::Value) -> Result<Box<dyn CompetencyMapper>>;

/// Provider-keyed registry of mapper constructors
///
/// Built once at startup; resolution is a plain map lookup.
#[derive(Default)]
pub struct MapperRegistry {
    factories: HashMap<Provider, MapperFactory>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the mapper constructor for a provider, replacing any
    /// previous registration.
    pub fn register(&mut self, provider: Provider, factory: MapperFactory) {
        self.factories.insert(provider, factory);
    }

    /// Build a mapper over `raw` for the given provider.
    ///
    /// An unregistered provider is a caller fault, not a transient failure.
    pub fn resolve(
        &self,
        provider: Provider,
        raw: &serde_json::Value,
    ) -> Result<Box<dyn CompetencyMapper>> {
        let factory = self.factories.get(&provider).ok_or_else(|| {
            Error::Validation(format!("no mapper registered for provider '{provider}'"))
        })?;
        factory(raw)
    }

    /// Providers with a registered mapper
    pub fn providers(&self) -> impl Iterator<Item = Provider> + '_ {
        self.factories.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::competency::{CompetencyType, Language};

    struct LabelMapper {
        label: String,
    }

    impl CompetencyMapper for LabelMapper {
        fn to_competency(&self) -> Result<Competency> {
            Ok(Competency {
                code: "L-1".into(),
                lang: Language::En,
                kind: CompetencyType::Skill,
                provider: Provider::Esco,
                title: self.label.clone(),
                url: None,
                category: None,
                description: None,
                keywords: None,
                indexed_text: None,
                metadata: None,
            })
        }
    }

    fn label_factory(raw: &serde_json::Value) -> Result<Box<dyn CompetencyMapper>> {
        let label = raw
            .get("preferredLabel")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Validation("missing preferredLabel".into()))?;
        Ok(Box::new(LabelMapper {
            label: label.to_string(),
        }))
    }

    #[test]
    fn test_registry_dispatch_by_tag() {
        let mut registry = MapperRegistry::new();
        registry.register(Provider::Esco, label_factory);

        let raw = serde_json::json!({"preferredLabel": "Python Programming"});
        let mapper = registry.resolve(Provider::Esco, &raw).unwrap();
        let competency = mapper.to_competency().unwrap();
        assert_eq!(competency.title, "Python Programming");
    }

    #[test]
    fn test_providers_lists_registrations() {
        let mut registry = MapperRegistry::new();
        assert_eq!(registry.providers().count(), 0);

        registry.register(Provider::Esco, label_factory);
        registry.register(Provider::Rome, label_factory);
        // Re-registering replaces, it does not add
        registry.register(Provider::Esco, label_factory);

        let mut providers: Vec<Provider> = registry.providers().collect();
        providers.sort_by_key(|p| p.to_string());
        assert_eq!(providers, vec![Provider::Esco, Provider::Rome]);
    }

    #[test]
    fn test_unregistered_provider_is_validation_error() {
        let registry = MapperRegistry::new();
        let err = registry
            .resolve(Provider::Rome, &serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_malformed_record_is_validation_error() {
        let mut registry = MapperRegistry::new();
        registry.register(Provider::Esco, label_factory);
        let err = registry
            .resolve(Provider::Esco, &serde_json::json!({"other": 1}))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
