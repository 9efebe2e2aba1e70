//! Technique catalog, embedding index, and matcher.
//!
//! Pipeline, in data-flow order:
//!
//! 1. [`catalog::load_catalog`] parses a STIX-style technique bundle into
//!    [`TechniqueRecord`](threatgraph_core::types::TechniqueRecord)s.
//! 2. [`builder::build_index`] embeds every record and produces a
//!    [`TechniqueIndex`] of L2-normalized vectors.
//! 3. [`IndexStore`] persists the index as JSON, recording the provider
//!    identity so later loads can reject provider mixes.
//! 4. [`TechniqueMatcher`] scores queries against the loaded index:
//!    exhaustive cosine scan, bounded domain boost, confidence tiers.
//!
//! The index is immutable after build; any number of matchers may share
//! one `Arc<TechniqueIndex>` without locking.

pub mod builder;
pub mod catalog;
pub mod matcher;
pub mod store;
pub mod types;

pub use builder::build_index;
pub use catalog::{load_catalog, parse_catalog, Catalog};
pub use matcher::TechniqueMatcher;
pub use store::IndexStore;
pub use types::{IndexEntry, TechniqueIndex};
