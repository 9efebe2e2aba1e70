//! Deterministic feature-hashing embedder.
//!
//! Maps text to a fixed-dimension vector by hashing word tokens and their
//! character trigrams into signed buckets (the hashing trick), then
//! L2-normalizing. Purely lexical: overlapping vocabulary scores high,
//! disjoint vocabulary scores near zero. No model download, no tokenizer
//! files, bit-for-bit reproducible across runs and machines.

use async_trait::async_trait;
use xxhash_rust::xxh3::xxh3_64;

use threatgraph_core::error::EmbeddingError;
use threatgraph_core::similarity::normalize;

use crate::embedder::{EmbeddingResult, TextEmbedder};

/// Identity-string family for this embedder; the full identity carries the
/// dimension, e.g. `hash-trigram-v1:384`.
pub const HASH_MODEL_FAMILY: &str = "hash-trigram-v1";

/// Character-trigram feature-hashing embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    id: String,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of the given dimensionality.
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::ProviderFailure {
                provider: HASH_MODEL_FAMILY.to_string(),
                reason: "dimension must be positive".to_string(),
            });
        }
        Ok(Self {
            dimension,
            id: format!("{HASH_MODEL_FAMILY}:{dimension}"),
        })
    }

    /// Hash one feature into a signed bucket.
    #[inline]
    fn deposit(&self, feature: &str, vector: &mut [f32]) {
        let h = xxh3_64(feature.as_bytes());
        let bucket = ((h >> 1) % self.dimension as u64) as usize;
        let sign = if h & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }
}

#[async_trait]
impl TextEmbedder for HashingEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            // Whole-token feature keeps one-character and two-character
            // tokens representable; trigrams carry the lexical overlap.
            self.deposit(token, &mut vector);
            let chars: Vec<char> = token.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                self.deposit(&trigram, &mut vector);
            }
        }

        normalize(&mut vector);
        Ok(vector)
    }
}
