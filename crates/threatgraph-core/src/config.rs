//! Configuration structures and tuning constants.
//!
//! Defaults mirror the values the pipeline was calibrated against; every
//! struct validates itself so bad values fail at startup, not mid-batch.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning constants shared across the pipeline.
pub mod constants {
    /// Default number of ranked matches returned per query.
    pub const DEFAULT_TOP_K: usize = 3;

    /// Default floor for "no usable match".
    ///
    /// Deliberately equal to [`LOW_CONFIDENCE_THRESHOLD`] so the `none`
    /// tier is filtered out of results by default; both remain
    /// independently configurable.
    pub const DEFAULT_MIN_SIMILARITY: f32 = 0.35;

    /// Adjusted score strictly above this is High confidence.
    pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.7;

    /// Adjusted score at or above this is Medium confidence.
    pub const MEDIUM_CONFIDENCE_THRESHOLD: f32 = 0.5;

    /// Adjusted score at or above this is Low confidence.
    pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.35;

    /// Default multiplicative boost when a query's context tag matches a
    /// candidate's tactic tags.
    pub const DEFAULT_DOMAIN_BOOST: f32 = 1.15;

    /// Hard cap on the domain boost factor.
    ///
    /// The boost exists to break near-ties, not to override semantics: it
    /// must never invert a similarity gap larger than the cap minus one.
    pub const MAX_DOMAIN_BOOST: f32 = 1.2;

    /// Default dimensionality for the hashing embedder.
    pub const DEFAULT_DIMENSION: usize = 384;

    /// Default per-query embedding timeout in milliseconds. Zero disables.
    pub const DEFAULT_EMBED_TIMEOUT_MS: u64 = 30_000;

    /// Default embedding model identity string.
    pub const DEFAULT_MODEL: &str = "hash-trigram-v1:384";
}

/// Matcher tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Multiplicative score boost on tactic-tag match, in `[1.0, 1.2]`.
    pub domain_boost: f32,
    /// Per-query embedding timeout in milliseconds; zero disables.
    pub embed_timeout_ms: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            domain_boost: constants::DEFAULT_DOMAIN_BOOST,
            embed_timeout_ms: constants::DEFAULT_EMBED_TIMEOUT_MS,
        }
    }
}

impl MatchConfig {
    /// Validate field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1.0..=constants::MAX_DOMAIN_BOOST).contains(&self.domain_boost) {
            return Err(ConfigError::Invalid {
                field: "domain_boost".to_string(),
                reason: format!(
                    "must be in [1.0, {}], got {}",
                    constants::MAX_DOMAIN_BOOST,
                    self.domain_boost
                ),
            });
        }
        Ok(())
    }
}

/// Embedding provider selection.
///
/// The model identity string is configuration, never hardcoded in the
/// matcher; it is also recorded in every persisted index so loads can
/// reject provider mixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider identity string, e.g. `hash-trigram-v1:384` or a
    /// sentence-embedding model name for the fastembed backend.
    pub model: String,
    /// Vector dimensionality for providers that take it as a parameter.
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: constants::DEFAULT_MODEL.to_string(),
            dimension: constants::DEFAULT_DIMENSION,
        }
    }
}

impl EmbeddingConfig {
    /// Build a config for a given model identity string.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Validate field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "model".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.dimension == 0 {
            return Err(ConfigError::Invalid {
                field: "dimension".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
