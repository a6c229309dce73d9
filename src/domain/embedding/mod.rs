//! Embedding domain models and traits

mod provider;
mod request;
mod vector;

pub use provider::{embed_one, Embedder, DIMENSION_SAMPLE};
pub use request::EmbeddingRequest;
pub use vector::{squared_euclidean_distance, Embedding};

#[cfg(test)]
pub use provider::MockEmbedder;
