//! Persisted index data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threatgraph_core::error::IndexError;

/// One indexed technique: identifier, normalized embedding, and the
/// denormalized metadata needed to assemble results without a second
/// catalog lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Technique identifier, e.g. `T1190`.
    pub technique_id: String,
    /// Technique name.
    pub name: String,
    /// Technique description.
    pub description: String,
    /// Tactic tags, used for domain weighting.
    pub tactics: Vec<String>,
    /// L2-normalized embedding vector.
    pub vector: Vec<f32>,
}

/// The searchable embedding index over a technique catalog.
///
/// All vectors share one dimensionality and one provider; mixing
/// providers is rejected at load time. Read-only after build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueIndex {
    /// Identity string of the embedding provider that built this index.
    pub embedding_model: String,
    /// Dimensionality of every vector in `entries`.
    pub embedding_dim: usize,
    /// Build timestamp.
    pub created_at: DateTime<Utc>,
    /// Version of the catalog source, e.g. `ATT&CK-18.0`.
    pub source_version: String,
    /// One entry per catalog technique.
    pub entries: Vec<IndexEntry>,
}

impl TechniqueIndex {
    /// Number of indexed techniques.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by technique identifier.
    pub fn get(&self, technique_id: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.technique_id == technique_id)
    }

    /// Check that every entry's vector matches the recorded dimensionality.
    pub fn validate_dimensions(&self) -> Result<(), IndexError> {
        for entry in &self.entries {
            if entry.vector.len() != self.embedding_dim {
                return Err(IndexError::DimensionMismatch {
                    technique_id: entry.technique_id.clone(),
                    expected: self.embedding_dim,
                    actual: entry.vector.len(),
                });
            }
        }
        Ok(())
    }
}
