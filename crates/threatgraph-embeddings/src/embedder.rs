//! Core trait for text-embedding providers.

use async_trait::async_trait;

use threatgraph_core::error::EmbeddingError;

/// Result alias for embedding operations.
pub type EmbeddingResult<T> = std::result::Result<T, EmbeddingError>;

/// A capability that maps a text string to a fixed-length vector.
///
/// Implementations must be `Send + Sync` so one provider can serve
/// concurrent queries against a shared index. The call may block on
/// external computation (local inference or a remote service); callers
/// treat it as slow and cancelable and wrap it in their own timeout.
///
/// # Determinism
///
/// Index rebuilds assume the provider is deterministic for a fixed
/// configuration: the same text yields the same vector. That is a stated
/// precondition, not something this trait can enforce.
///
/// # Errors
///
/// - [`EmbeddingError::EmptyInput`] for empty or whitespace-only text
/// - [`EmbeddingError::ProviderFailure`] when the backend fails
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Stable identity string for this provider configuration.
    ///
    /// Recorded in every index built with this provider and validated on
    /// load; two embedders with equal ids must produce compatible vectors.
    fn id(&self) -> &str;

    /// Dimensionality of produced vectors.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embed a batch of texts.
    ///
    /// The default loops over [`embed`](Self::embed); backends with a
    /// native batch entry point should override it.
    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}
