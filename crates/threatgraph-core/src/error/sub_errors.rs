//! Sub-error types for threatgraph-core.
//!
//! Each error type covers a specific domain of failures.

use thiserror::Error;

// ============================================================================
// CATALOG ERROR
// ============================================================================

/// Technique-catalog loading errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog bundle could not be parsed as the expected structure.
    #[error("Malformed catalog: {0}")]
    Malformed(String),

    /// The catalog parsed but produced zero usable technique records.
    ///
    /// The index builder must refuse to build from an empty catalog rather
    /// than persist a degenerate index.
    #[error("Catalog contains no usable technique records")]
    Empty,

    /// Catalog file could not be read.
    #[error("Catalog read failed for {path}: {source}")]
    Io {
        /// Path that failed to read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// INDEX ERROR
// ============================================================================

/// Persisted-index errors.
///
/// Covers provider validation, dimensionality checks, and file integrity.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The persisted index was built by a different embedding provider than
    /// the one configured at load time.
    ///
    /// Mixing indexes across providers is undefined; callers must rebuild.
    #[error("Index provider mismatch: index built with '{actual}', configured provider is '{expected}'")]
    ProviderMismatch {
        /// Provider identity configured at load time
        expected: String,
        /// Provider identity recorded in the index
        actual: String,
    },

    /// An entry's vector does not match the index dimensionality.
    #[error("Index dimension mismatch for {technique_id}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Technique whose vector is off
        technique_id: String,
        /// Dimensionality recorded in the index header
        expected: usize,
        /// Actual vector length
        actual: usize,
    },

    /// No index file at the expected path.
    #[error("Index not found: {path}")]
    NotFound {
        /// Path that was probed
        path: String,
    },

    /// The index file exists but cannot be decoded.
    #[error("Corrupt index: {0}")]
    Corrupt(String),

    /// Index could not be written.
    #[error("Index write failed for {path}: {source}")]
    WriteFailed {
        /// Destination path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// EMBEDDING ERROR
// ============================================================================

/// Embedding-provider errors.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Empty input text provided for embedding.
    #[error("Empty input text")]
    EmptyInput,

    /// The provider failed to produce a vector.
    ///
    /// Not caught inside the matcher: one failed query must not corrupt
    /// results already computed for sibling queries in the same batch.
    #[error("Embedding provider '{provider}' failed: {reason}")]
    ProviderFailure {
        /// Provider identity string
        provider: String,
        /// Detailed reason for failure
        reason: String,
    },

    /// The provider did not answer within the batch-level budget.
    #[error("Embedding timed out after {0}ms")]
    Timeout(u64),

    /// The provider returned a vector of the wrong length.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality the provider advertises
        expected: usize,
        /// Actual vector length returned
        actual: usize,
    },

    /// No provider registered for the requested model identity.
    #[error("Unknown embedding model: {0}")]
    UnknownModel(String),
}

// ============================================================================
// DOCUMENT ERROR
// ============================================================================

/// Attack-tree document errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document contains no attack-tree diagram at all.
    #[error("No attack-tree diagram found in document")]
    NoDiagram,

    /// The diagram source does not match the expected node/edge syntax.
    ///
    /// Fatal for the one document; a directory-wide enrichment run skips
    /// the offending file and continues.
    #[error("Diagram syntax error: {0}")]
    Syntax(String),

    /// Document could not be read or written.
    #[error("Document I/O failed for {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// CONFIG ERROR
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration value is out of range or inconsistent.
    #[error("Invalid configuration: {field}: {reason}")]
    Invalid {
        /// Configuration field name
        field: String,
        /// Reason why it is invalid
        reason: String,
    },
}
