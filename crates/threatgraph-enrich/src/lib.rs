//! Attack-tree document enrichment.
//!
//! Parses attack-tree diagram sources (Mermaid `graph TD`, bare or inside
//! a markdown fence), matches every node label against a technique index,
//! and rewrites matched labels to carry the technique identifier as a
//! structured prefix (`[T1190] original label`), leaving graph topology,
//! styling, and every other byte of the document untouched.
//!
//! Enrichment is strictly additive and idempotent: nodes that already
//! carry a prefix are skipped, a run that matches nothing returns its
//! input byte-identical, and running twice equals running once.

mod document;
mod enricher;

pub use document::{DiagramDocument, DiagramEdge, DiagramNode};
pub use enricher::{EnrichStats, TreeEnricher};
