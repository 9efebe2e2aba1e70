//! Top-level unified error type for the threatgraph workspace.

use thiserror::Error;

use super::sub_errors::{CatalogError, ConfigError, DocumentError, EmbeddingError, IndexError};
use crate::similarity::SimilarityError;

/// Top-level unified error type.
///
/// All crate errors convert into this type via `From` implementations, so
/// pipeline code can use a single [`Result`] alias and `?` throughout.
///
/// # Exit Codes
///
/// The CLI maps errors to process exit codes through [`exit_code`]:
/// - `1`: ordinary failure (bad input, missing file, provider failure)
/// - `2`: index corruption or provider mismatch; the persisted index
///   cannot be trusted and must be rebuilt
///
/// [`exit_code`]: ThreatGraphError::exit_code
#[derive(Debug, Error)]
pub enum ThreatGraphError {
    /// Catalog loading error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Persisted-index error.
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Embedding-provider error.
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Attack-tree document error.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Vector-arithmetic error.
    #[error("Similarity error: {0}")]
    Similarity(#[from] SimilarityError),

    /// Uncontextualized I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ThreatGraphError {
    /// Whether this error means the persisted index cannot be trusted.
    ///
    /// Corruption-class errors require a rebuild; retrying the same
    /// operation against the same file cannot succeed.
    #[inline]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Index(IndexError::ProviderMismatch { .. })
                | Self::Index(IndexError::DimensionMismatch { .. })
                | Self::Index(IndexError::Corrupt(_))
        )
    }

    /// Process exit code for this error.
    #[inline]
    pub fn exit_code(&self) -> i32 {
        if self.is_corruption() {
            2
        } else {
            1
        }
    }
}

/// Result type alias for threatgraph operations.
pub type Result<T> = std::result::Result<T, ThreatGraphError>;
