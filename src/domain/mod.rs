//! Domain layer - embeddings, nearest-neighbor index, semantic cache and schema retrieval

pub mod context;
pub mod embedding;
pub mod error;
pub mod schema;
pub mod semantic_cache;
pub mod vector_index;

pub use context::{ContextConfig, ContextManager};
pub use embedding::{Embedder, Embedding};
pub use error::DomainError;
pub use schema::{SchemaCorpus, SchemaRetriever, SchemaRetrieverConfig};
pub use semantic_cache::{CacheHit, SemanticCache, SemanticCacheConfig};
pub use vector_index::{Neighbor, VectorIndex};
