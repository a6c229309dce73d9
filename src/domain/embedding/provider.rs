//! Embedder capability trait

use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use super::Embedding;
use crate::domain::DomainError;

/// Text used to discover an embedder's output dimensionality
pub const DIMENSION_SAMPLE: &str = "dimension sample";

/// Trait for text embedding backends (local hashing, OpenAI-compatible, etc.)
///
/// `embed` must be a pure function of the input text and the embedder's fixed
/// model state: one output per input, in input order.
#[cfg_attr(test, automock)]
pub trait Embedder: Send + Sync + Debug {
    /// Embed a batch of texts. An empty batch yields an empty result.
    fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the output dimensionality, embedding a sample string by default
    fn dimensions(&self) -> Result<usize, DomainError> {
        let sample = embed_one(self, DIMENSION_SAMPLE)?;
        Ok(sample.dimensions())
    }
}

/// Embed a single text, checking the backend returned exactly one vector
pub fn embed_one<E: Embedder + ?Sized>(embedder: &E, text: &str) -> Result<Embedding, DomainError> {
    let mut embeddings = embedder.embed(&[text.to_string()])?;

    if embeddings.len() != 1 {
        return Err(DomainError::embedding(
            embedder.provider_name(),
            format!("Expected 1 embedding, got {}", embeddings.len()),
        ));
    }

    Ok(embeddings.remove(0))
}
