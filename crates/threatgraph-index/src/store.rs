//! Index persistence and load-time validation.

use std::path::{Path, PathBuf};

use tracing::info;

use threatgraph_core::error::IndexError;

use crate::types::TechniqueIndex;

/// Manages one persisted index file.
///
/// The file is JSON: provider identity, dimensionality, build timestamp,
/// source version, and the full entry list. Loads validate integrity;
/// [`load_validated`](IndexStore::load_validated) additionally rejects a
/// provider mismatch so an index is never searched with vectors from a
/// different model.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    /// Create a store for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the index file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Persist an index, creating parent directories as needed.
    pub fn save(&self, index: &TechniqueIndex) -> Result<(), IndexError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| IndexError::WriteFailed {
                path: self.path.display().to_string(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(index)
            .map_err(|e| IndexError::Corrupt(format!("serialization failed: {e}")))?;
        std::fs::write(&self.path, json).map_err(|source| IndexError::WriteFailed {
            path: self.path.display().to_string(),
            source,
        })?;
        info!(
            path = %self.path.display(),
            techniques = index.len(),
            model = %index.embedding_model,
            "index saved"
        );
        Ok(())
    }

    /// Load the index, validating structural integrity only.
    ///
    /// Callers that already know which provider they will search with
    /// should prefer [`load_validated`](IndexStore::load_validated).
    pub fn load(&self) -> Result<TechniqueIndex, IndexError> {
        if !self.path.exists() {
            return Err(IndexError::NotFound {
                path: self.path.display().to_string(),
            });
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| IndexError::Corrupt(format!("read failed: {e}")))?;
        let index: TechniqueIndex =
            serde_json::from_str(&raw).map_err(|e| IndexError::Corrupt(e.to_string()))?;
        index.validate_dimensions()?;
        info!(
            path = %self.path.display(),
            techniques = index.len(),
            model = %index.embedding_model,
            dimension = index.embedding_dim,
            "index loaded"
        );
        Ok(index)
    }

    /// Load the index and reject a provider mismatch.
    pub fn load_validated(&self, expected_model: &str) -> Result<TechniqueIndex, IndexError> {
        let index = self.load()?;
        if index.embedding_model != expected_model {
            return Err(IndexError::ProviderMismatch {
                expected: expected_model.to_string(),
                actual: index.embedding_model,
            });
        }
        Ok(index)
    }
}
