//! Embedding backend implementations

mod factory;
mod hashing;
mod openai;

pub use factory::{create_embedder, EmbedderConfig, EmbedderType};
pub use hashing::{HashingEmbedder, DEFAULT_HASHING_DIMENSIONS};
pub use openai::OpenAiEmbedder;
