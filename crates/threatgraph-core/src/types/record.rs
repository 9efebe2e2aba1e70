//! Technique catalog records.

use serde::{Deserialize, Serialize};

/// One attack-technique record from the catalog.
///
/// Immutable once loaded; lifecycle is bounded to one index build. The
/// description carries the primary semantic content, the name disambiguates
/// short descriptions, and the tactic tags drive domain weighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueRecord {
    /// Catalog-unique identifier, e.g. `T1190` or `T1190.001`.
    pub id: String,
    /// Human-readable technique name.
    pub name: String,
    /// Free-text description; the primary embedding content.
    pub description: String,
    /// Tactic/category tags, e.g. `initial-access`.
    pub tactics: Vec<String>,
    /// Parent technique id for sub-techniques (`T1190.001` -> `T1190`).
    pub parent_id: Option<String>,
}

impl TechniqueRecord {
    /// Create a record, deriving the parent id from a dotted identifier.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        tactics: Vec<String>,
    ) -> Self {
        let id = id.into();
        let parent_id = parent_of(&id);
        Self {
            id,
            name: name.into(),
            description: description.into(),
            tactics,
            parent_id,
        }
    }

    /// Whether this record is a sub-technique.
    #[inline]
    pub fn is_subtechnique(&self) -> bool {
        self.parent_id.is_some()
    }

    /// The text submitted to the embedding provider for this record.
    ///
    /// Name and description are concatenated so short descriptions still
    /// carry the technique name's vocabulary.
    pub fn embed_text(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }
}

/// Derive the parent technique id from a dotted sub-technique id.
///
/// Returns `None` for top-level identifiers.
fn parent_of(id: &str) -> Option<String> {
    id.split_once('.').map(|(parent, _)| parent.to_string())
}
