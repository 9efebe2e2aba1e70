//! Threatgraph core library
//!
//! Domain types, similarity primitives, configuration, and the unified
//! error taxonomy shared by every threatgraph crate.
//!
//! # Architecture
//!
//! This crate defines:
//! - Domain types ([`TechniqueRecord`], [`MatchQuery`], [`TechniqueMatch`],
//!   [`ConfidenceTier`])
//! - Dense-vector similarity primitives (L2 norm, normalization, cosine)
//! - Configuration structures with validated defaults
//! - Error types and the crate-wide [`Result`] alias
//!
//! The heavier machinery lives downstream: embedding providers in
//! `threatgraph-embeddings`, the catalog/index/matcher pipeline in
//! `threatgraph-index`, and document enrichment in `threatgraph-enrich`.
//!
//! # Example
//!
//! ```
//! use threatgraph_core::types::{ConfidenceTier, MatchQuery};
//!
//! let query = MatchQuery::new("attacker exploits an internet-facing API")
//!     .with_context("initial-access");
//! assert_eq!(query.context.as_deref(), Some("initial-access"));
//! assert_eq!(ConfidenceTier::from_score(0.82), ConfidenceTier::High);
//! ```

pub mod config;
pub mod error;
pub mod similarity;
pub mod types;

// Re-exports for convenience
pub use config::{EmbeddingConfig, MatchConfig};
pub use error::{Result, ThreatGraphError};
pub use types::{ConfidenceTier, MatchQuery, TechniqueMatch, TechniqueRecord};
