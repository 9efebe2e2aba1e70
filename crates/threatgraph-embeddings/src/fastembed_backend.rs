//! Real sentence-embedding models via fastembed (feature `fastembed`).

use std::sync::Mutex;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use threatgraph_core::error::EmbeddingError;

use crate::embedder::{EmbeddingResult, TextEmbedder};

/// ONNX sentence-embedding backend.
///
/// Model weights are downloaded on first use and cached by fastembed; the
/// identity string is the model name as passed to the factory.
pub struct FastEmbedEmbedder {
    inner: Mutex<TextEmbedding>,
    id: String,
    dimension: usize,
}

impl FastEmbedEmbedder {
    /// Load the named model.
    pub fn try_new(model_name: &str) -> Result<Self, EmbeddingError> {
        let model = resolve_model(model_name)?;
        let dimension = TextEmbedding::get_model_info(&model)
            .map(|info| info.dim)
            .map_err(|e| EmbeddingError::ProviderFailure {
                provider: model_name.to_string(),
                reason: e.to_string(),
            })?;

        info!(model = model_name, dimension, "loading fastembed model");
        let inner = TextEmbedding::try_new(
            InitOptions::new(model).with_show_download_progress(false),
        )
        .map_err(|e| EmbeddingError::ProviderFailure {
            provider: model_name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            inner: Mutex::new(inner),
            id: model_name.to_string(),
            dimension,
        })
    }
}

fn resolve_model(name: &str) -> Result<EmbeddingModel, EmbeddingError> {
    // fastembed names models by their HuggingFace repo id.
    match name {
        "sentence-transformers/all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "BAAI/bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "BAAI/bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        _ => Err(EmbeddingError::UnknownModel(name.to_string())),
    }
}

#[async_trait]
impl TextEmbedder for FastEmbedEmbedder {
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
        let mut vectors = {
            let inner = self.inner.lock().map_err(|_| EmbeddingError::ProviderFailure {
                provider: self.id.clone(),
                reason: "model mutex poisoned".to_string(),
            })?;
            inner
                .embed(vec![text], None)
                .map_err(|e| EmbeddingError::ProviderFailure {
                    provider: self.id.clone(),
                    reason: e.to_string(),
                })?
        };
        vectors.pop().ok_or_else(|| EmbeddingError::ProviderFailure {
            provider: self.id.clone(),
            reason: "model returned no vector".to_string(),
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::EmptyInput);
        }
        let inner = self.inner.lock().map_err(|_| EmbeddingError::ProviderFailure {
            provider: self.id.clone(),
            reason: "model mutex poisoned".to_string(),
        })?;
        inner
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::ProviderFailure {
                provider: self.id.clone(),
                reason: e.to_string(),
            })
    }
}
