//! Embedding request body for remote embedding APIs

use serde::Serialize;

/// Request body for an OpenAI-compatible embeddings endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

impl EmbeddingRequest {
    /// Create a request embedding `input` in order
    pub fn new(model: impl Into<String>, input: Vec<String>) -> Self {
        Self {
            model: model.into(),
            input,
            dimensions: None,
        }
    }

    /// Request a specific output dimensionality
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}
