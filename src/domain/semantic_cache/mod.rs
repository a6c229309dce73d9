//! Semantic cache domain models
//!
//! Provides vector-based caching that matches semantically similar queries
//! rather than requiring exact key matches.

mod cache;
mod config;
mod entry;

pub use cache::{similarity_from_distance, SemanticCache};
pub use config::SemanticCacheConfig;
pub use entry::{CacheEntry, CacheHit, ResultRow, SemanticCacheStats};
