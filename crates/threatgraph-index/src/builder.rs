//! Embedding index construction.

use chrono::Utc;
use tracing::info;

use threatgraph_core::error::{CatalogError, EmbeddingError};
use threatgraph_core::similarity::{l2_norm, normalize};
use threatgraph_core::Result;

use threatgraph_embeddings::TextEmbedder;

use crate::catalog::Catalog;
use crate::types::{IndexEntry, TechniqueIndex};

/// Build a searchable index from a loaded catalog.
///
/// Each record's name and description are embedded together, and every
/// vector is L2-normalized here so cosine similarity at match time reduces
/// to a single dot product per candidate.
///
/// Refuses to build from an empty catalog: a degenerate index must never
/// reach persistence. Determinism (same catalog + same provider = same
/// vectors) is a precondition inherited from the provider.
pub async fn build_index(
    catalog: &Catalog,
    embedder: &dyn TextEmbedder,
) -> Result<TechniqueIndex> {
    if catalog.records.is_empty() {
        return Err(CatalogError::Empty.into());
    }

    let texts: Vec<String> = catalog.records.iter().map(|r| r.embed_text()).collect();
    info!(
        records = texts.len(),
        provider = embedder.id(),
        "embedding catalog records"
    );
    let vectors = embedder.embed_batch(&texts).await?;

    let dimension = embedder.dimension();
    let mut entries = Vec::with_capacity(catalog.records.len());
    for (record, mut vector) in catalog.records.iter().zip(vectors) {
        if vector.len() != dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            }
            .into());
        }
        if l2_norm(&vector) < f32::EPSILON {
            return Err(EmbeddingError::ProviderFailure {
                provider: embedder.id().to_string(),
                reason: format!("zero-magnitude embedding for {}", record.id),
            }
            .into());
        }
        normalize(&mut vector);
        entries.push(IndexEntry {
            technique_id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            tactics: record.tactics.clone(),
            vector,
        });
    }

    Ok(TechniqueIndex {
        embedding_model: embedder.id().to_string(),
        embedding_dim: dimension,
        created_at: Utc::now(),
        source_version: catalog.source_version.clone(),
        entries,
    })
}
