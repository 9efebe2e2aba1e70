//! Error types for the threatgraph workspace.
//!
//! This module defines the central error types used across the pipeline:
//!
//! - [`ThreatGraphError`]: top-level unified error
//! - Sub-error types: [`CatalogError`], [`IndexError`], [`EmbeddingError`],
//!   [`DocumentError`], [`ConfigError`]
//!
//! Library code never panics; everything fallible returns [`Result`] and
//! propagates with `?`. Errors carry the offending path, provider identity,
//! or query so the CLI can surface them without losing context.

mod sub_errors;
mod unified;


pub use sub_errors::{CatalogError, ConfigError, DocumentError, EmbeddingError, IndexError};
pub use unified::{Result, ThreatGraphError};
