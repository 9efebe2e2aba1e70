//! Provider factory: model identity string -> concrete embedder.

use std::sync::Arc;

use tracing::debug;

use threatgraph_core::config::EmbeddingConfig;
use threatgraph_core::error::EmbeddingError;

use crate::embedder::TextEmbedder;
use crate::hashing::{HashingEmbedder, HASH_MODEL_FAMILY};

/// Resolve an embedding configuration to a concrete provider.
///
/// Recognized identities:
/// - `hash-trigram-v1`: hashing embedder at `config.dimension`
/// - `hash-trigram-v1:<dim>`: hashing embedder at the stated dimension
///   (the form recorded in persisted indexes)
/// - anything else: a fastembed model name when the `fastembed` feature
///   is enabled, otherwise [`EmbeddingError::UnknownModel`]
pub fn embedder_for(config: &EmbeddingConfig) -> Result<Arc<dyn TextEmbedder>, EmbeddingError> {
    let model = config.model.trim();
    debug!(model, "resolving embedding provider");

    if model == HASH_MODEL_FAMILY {
        return Ok(Arc::new(HashingEmbedder::new(config.dimension)?));
    }

    if let Some(dim) = model
        .strip_prefix(HASH_MODEL_FAMILY)
        .and_then(|rest| rest.strip_prefix(':'))
    {
        let dimension: usize = dim
            .parse()
            .map_err(|_| EmbeddingError::UnknownModel(model.to_string()))?;
        return Ok(Arc::new(HashingEmbedder::new(dimension)?));
    }

    #[cfg(feature = "fastembed")]
    {
        return Ok(Arc::new(crate::fastembed_backend::FastEmbedEmbedder::try_new(model)?));
    }

    #[cfg(not(feature = "fastembed"))]
    Err(EmbeddingError::UnknownModel(model.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_hash_family_with_config_dimension() {
        let config = EmbeddingConfig {
            model: "hash-trigram-v1".to_string(),
            dimension: 128,
        };
        let embedder = embedder_for(&config).unwrap();
        assert_eq!(embedder.dimension(), 128);
        assert_eq!(embedder.id(), "hash-trigram-v1:128");
    }

    #[test]
    fn resolves_full_identity_string() {
        // The dimension suffix wins over the config field: this is the
        // round-trip path for identities read back from an index.
        let config = EmbeddingConfig {
            model: "hash-trigram-v1:384".to_string(),
            dimension: 64,
        };
        let embedder = embedder_for(&config).unwrap();
        assert_eq!(embedder.dimension(), 384);
        assert_eq!(embedder.id(), "hash-trigram-v1:384");
    }

    #[test]
    fn garbled_dimension_suffix_rejected() {
        let config = EmbeddingConfig::for_model("hash-trigram-v1:many");
        assert!(matches!(
            embedder_for(&config),
            Err(EmbeddingError::UnknownModel(_))
        ));
    }

    #[cfg(not(feature = "fastembed"))]
    #[test]
    fn unknown_model_rejected_without_fastembed() {
        let config = EmbeddingConfig::for_model("sentence-transformers/all-MiniLM-L6-v2");
        assert!(matches!(
            embedder_for(&config),
            Err(EmbeddingError::UnknownModel(_))
        ));
    }
}
