//! Text-embedding providers for threatgraph.
//!
//! The [`TextEmbedder`] trait is the seam between the matching pipeline and
//! whatever model produces vectors. The concrete model is configuration,
//! resolved by [`embedder_for`], never hardcoded downstream.
//!
//! Two backends:
//! - [`HashingEmbedder`]: deterministic character-trigram feature hashing.
//!   No model download, no tokenizer; suitable offline and in tests.
//! - `FastEmbedEmbedder` (feature `fastembed`): real sentence-embedding
//!   models via ONNX.
//!
//! Every index records the identity string of the provider that built it;
//! loading with a different provider is rejected, so the identity string
//! must be stable per configuration.

mod embedder;
mod factory;
mod hashing;

#[cfg(feature = "fastembed")]
mod fastembed_backend;

pub use embedder::{EmbeddingResult, TextEmbedder};
pub use factory::embedder_for;
pub use hashing::{HashingEmbedder, HASH_MODEL_FAMILY};

#[cfg(feature = "fastembed")]
pub use fastembed_backend::FastEmbedEmbedder;
