//! The canonical competency record and its closed enumerations
//!
//! A [`Competency`] is the unit managed by the engine: a skill, occupation or
//! certification sourced from an external taxonomy. Source-specific cleaning
//! happens upstream in the provider adapters; this type only enforces the
//! structural invariants the indexing path relies on.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Originating external taxonomy of a competency record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// European Skills, Competences, Qualifications and Occupations
    Esco,
    /// Répertoire Opérationnel des Métiers et des Emplois
    Rome,
    /// Formacode thesaurus
    Forma,
    /// Formacode v14
    Forma14,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Esco => write!(f, "esco"),
            Provider::Rome => write!(f, "rome"),
            Provider::Forma => write!(f, "forma"),
            Provider::Forma14 => write!(f, "forma14"),
        }
    }
}

/// Kind of competency record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetencyType {
    Occupation,
    Skill,
    Certification,
}

/// Language of a competency record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
}

/// Canonical competency record
///
/// Optional fields are omitted from serialized payloads when absent, so the
/// stored payload round-trips without `null` noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competency {
    /// Original code/identifier from the source. Unique within its provider.
    pub code: String,
    /// Language of this item
    pub lang: Language,
    /// Type (occupation, skill, certification)
    #[serde(rename = "type")]
    pub kind: CompetencyType,
    /// Source provider
    pub provider: Provider,
    /// Preferred human-readable label. Required, non-empty.
    pub title: String,
    /// URL in the source repository, if available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Broad category/domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Longer description, definition, scope note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Synonyms, alternative labels, hidden labels. Order preserved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Text fed to the encoders. Defaults to [`Competency::effective_indexed_text`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_text: Option<String>,
    /// Open, arbitrarily nested metadata, queryable only through filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Competency {
    /// Validate the structural invariants required before indexing.
    ///
    /// `lang`, `type` and `provider` are enforced by the type system at
    /// deserialization time; what remains is that the source code and title
    /// carry actual content.
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(Error::Validation("competency code cannot be empty".into()));
        }
        if self.title.trim().is_empty() {
            return Err(Error::Validation("competency title cannot be empty".into()));
        }
        Ok(())
    }

    /// Text actually fed to the encoders.
    ///
    /// Uses `indexed_text` when supplied; otherwise a deterministic
    /// combination of `title` and `description` joined by a newline.
    pub fn effective_indexed_text(&self) -> String {
        if let Some(text) = &self.indexed_text {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
        match self.description.as_deref().map(str::trim) {
            Some(desc) if !desc.is_empty() => format!("{}\n{}", self.title.trim(), desc),
            _ => self.title.trim().to_string(),
        }
    }
}
