//! Similarity-gated query cache

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use super::entry::{CacheEntry, CacheHit, ResultRow, SemanticCacheStats};
use super::SemanticCacheConfig;
use crate::domain::embedding::{embed_one, Embedder};
use crate::domain::vector_index::VectorIndex;
use crate::domain::DomainError;

/// Convert a squared distance into a similarity score in (0, 1]
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Semantic cache keyed by enriched question text
///
/// Entries live in a single arena whose positions match the vector index
/// ordinals. Only the single nearest entry is ever considered on lookup.
#[derive(Debug)]
pub struct SemanticCache {
    embedder: Arc<dyn Embedder>,
    config: SemanticCacheConfig,
    entries: Vec<CacheEntry>,
    /// Created on the first `add`
    index: Option<VectorIndex>,
    hits: AtomicU64,
    misses: AtomicU64,
    total_hit_similarity: RwLock<f64>,
}

impl SemanticCache {
    /// Create an empty cache
    pub fn new(embedder: Arc<dyn Embedder>, config: SemanticCacheConfig) -> Result<Self, DomainError> {
        let threshold = config.similarity_threshold;

        if !(0.0..=1.0).contains(&threshold) {
            return Err(DomainError::configuration(format!(
                "Similarity threshold must be between 0 and 1, got {}",
                threshold
            )));
        }

        Ok(Self {
            embedder,
            config,
            entries: Vec::new(),
            index: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            total_hit_similarity: RwLock::new(0.0),
        })
    }

    /// Create a cache with the default configuration
    pub fn with_defaults(embedder: Arc<dyn Embedder>) -> Result<Self, DomainError> {
        Self::new(embedder, SemanticCacheConfig::default())
    }

    pub fn similarity_threshold(&self) -> f32 {
        self.config.similarity_threshold
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a new entry at the next ordinal and return that ordinal
    ///
    /// Duplicate key texts produce independent entries. If embedding or
    /// indexing fails the cache is left exactly as it was.
    pub fn add(
        &mut self,
        key_text: impl Into<String>,
        sql: impl Into<String>,
        structured_result: Vec<ResultRow>,
        display_result: impl Into<String>,
    ) -> Result<usize, DomainError> {
        let key_text = key_text.into();

        if key_text.trim().is_empty() {
            return Err(DomainError::validation("Cache key text cannot be empty"));
        }

        info!(key = %self.preview(&key_text), "Storing query in cache");

        let embedding = embed_one(self.embedder.as_ref(), &key_text)?;

        match self.index.as_mut() {
            Some(index) => index.add(vec![embedding])?,
            None => {
                // The first output fixes the embedder's dimensionality
                let mut index = VectorIndex::new(embedding.dimensions())?;
                index.add(vec![embedding])?;
                self.index = Some(index);
            }
        }

        let ordinal = self.entries.len();
        self.entries
            .push(CacheEntry::new(key_text, sql, structured_result, display_result));

        debug_assert_eq!(
            self.index.as_ref().map(VectorIndex::len),
            Some(self.entries.len())
        );

        Ok(ordinal)
    }

    /// Look up the nearest cached entry and return its payload if similar enough
    ///
    /// An empty cache is a miss, not an error.
    pub fn search(&self, key_text: &str) -> Result<Option<CacheHit>, DomainError> {
        let Some(index) = self.index.as_ref().filter(|index| !index.is_empty()) else {
            info!("Cache miss: cache empty");
            self.record_miss();
            return Ok(None);
        };

        debug!(key = %self.preview(key_text), "Searching cache");

        let query = embed_one(self.embedder.as_ref(), key_text)?;

        let Some(nearest) = index.search(&query, 1)?.into_iter().next() else {
            self.record_miss();
            return Ok(None);
        };

        let similarity = similarity_from_distance(nearest.distance);

        if similarity < self.config.similarity_threshold {
            info!(score = similarity, "Cache miss");
            self.record_miss();
            return Ok(None);
        }

        let entry = self.entries.get(nearest.ordinal).ok_or_else(|| {
            DomainError::internal(format!(
                "Index ordinal {} has no cache entry ({} entries)",
                nearest.ordinal,
                self.entries.len()
            ))
        })?;

        info!(
            score = similarity,
            ordinal = nearest.ordinal,
            matched = %self.preview(entry.key_text()),
            "Cache hit"
        );
        self.record_hit(similarity);

        Ok(Some(CacheHit::from_entry(nearest.ordinal, similarity, entry)))
    }

    /// Get cache statistics
    pub fn stats(&self) -> SemanticCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = *self
            .total_hit_similarity
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let avg_hit_similarity = if hits == 0 {
            0.0
        } else {
            (total / hits as f64) as f32
        };

        SemanticCacheStats {
            total_entries: self.entries.len(),
            hits,
            misses: self.misses.load(Ordering::Relaxed),
            avg_hit_similarity,
        }
    }

    fn record_hit(&self, similarity: f32) {
        self.hits.fetch_add(1, Ordering::Relaxed);

        let mut total = self
            .total_hit_similarity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *total += similarity as f64;
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn preview(&self, text: &str) -> String {
        let limit = self.config.log_preview_chars;
        let mut preview: String = text.chars().take(limit).collect();

        if text.chars().count() > limit {
            preview.push_str("...");
        }

        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::{Embedding, MockEmbedder};
    use crate::infrastructure::embedding::{HashingEmbedder, OpenAiEmbedder};
    use crate::infrastructure::http_client::mock::MockHttpClient;
    use serde_json::json;

    fn hashing_cache(threshold: f32) -> SemanticCache {
        let embedder = Arc::new(HashingEmbedder::new(384).unwrap());
        let config = SemanticCacheConfig::new().with_similarity_threshold(threshold);
        SemanticCache::new(embedder, config).unwrap()
    }

    fn customer_rows() -> Vec<ResultRow> {
        vec![
            json!({"id": 1, "name": "Alice", "city": "New York"}),
            json!({"id": 2, "name": "Bob", "city": "San Francisco"}),
            json!({"id": 3, "name": "Charlie", "city": "New York"}),
        ]
        .into_iter()
        .map(|value| value.as_object().cloned().unwrap())
        .collect()
    }

    const CUSTOMER_TABLE: &str = "+----+---------+---------------+\n\
                                  | id | name    | city          |\n\
                                  +----+---------+---------------+";

    #[test]
    fn test_similarity_from_distance() {
        assert_eq!(similarity_from_distance(0.0), 1.0);
        assert!((similarity_from_distance(1.0) - 0.5).abs() < 1e-6);
        assert!(similarity_from_distance(3.0) < similarity_from_distance(2.0));
    }

    #[test]
    fn test_new_rejects_out_of_range_threshold() {
        let embedder = Arc::new(HashingEmbedder::new(8).unwrap());
        let mut config = SemanticCacheConfig::default();
        config.similarity_threshold = 1.5;

        let result = SemanticCache::new(embedder, config);

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_search_empty_cache_is_miss() {
        let cache = hashing_cache(0.8);

        let result = cache.search("show all customers").unwrap();

        assert!(result.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_add_then_search_same_text_round_trips() {
        let mut cache = hashing_cache(0.8);

        let ordinal = cache
            .add(
                "show all customers",
                "SELECT * FROM customers;",
                customer_rows(),
                CUSTOMER_TABLE,
            )
            .unwrap();

        let hit = cache.search("show all customers").unwrap().unwrap();

        assert_eq!(ordinal, 0);
        assert_eq!(hit.ordinal, 0);
        assert_eq!(hit.similarity, 1.0);
        assert_eq!(hit.sql, "SELECT * FROM customers;");
        assert_eq!(hit.structured_result, customer_rows());
        assert_eq!(hit.display_result, CUSTOMER_TABLE);
    }

    #[test]
    fn test_exact_match_hits_at_threshold_one() {
        let mut cache = hashing_cache(1.0);
        cache
            .add("show all customers", "SELECT * FROM customers;", vec![], "")
            .unwrap();

        assert!(cache.search("show all customers").unwrap().is_some());
        assert!(cache.search("show all orders").unwrap().is_none());
    }

    #[test]
    fn test_search_near_first_of_two_entries() {
        let mut cache = hashing_cache(0.75);
        cache
            .add("show all customers", "SELECT * FROM customers;", customer_rows(), "customers")
            .unwrap();
        cache
            .add(
                "total order amount per product",
                "SELECT product, SUM(amount) FROM orders GROUP BY product;",
                vec![],
                "totals",
            )
            .unwrap();

        let hit = cache.search("show all customers please").unwrap().unwrap();

        assert_eq!(hit.ordinal, 0);
        assert_eq!(hit.sql, "SELECT * FROM customers;");
        assert!(hit.similarity < 1.0);
    }

    #[test]
    fn test_near_match_below_default_threshold_misses() {
        let mut cache = hashing_cache(0.80);
        cache
            .add("show all customers", "SELECT * FROM customers;", vec![], "")
            .unwrap();

        assert!(cache.search("show all customers please").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_keys_create_independent_entries() {
        let mut cache = hashing_cache(0.8);

        let first = cache.add("show all customers", "SELECT 1;", vec![], "").unwrap();
        let second = cache.add("show all customers", "SELECT 2;", vec![], "").unwrap();

        assert_eq!((first, second), (0, 1));
        assert_eq!(cache.len(), 2);

        // Equal distances resolve to the lower ordinal
        let hit = cache.search("show all customers").unwrap().unwrap();
        assert_eq!(hit.sql, "SELECT 1;");
    }

    #[test]
    fn test_search_is_deterministic() {
        let mut cache = hashing_cache(0.5);
        cache.add("list customers in new york", "SELECT 1;", vec![], "").unwrap();
        cache.add("show all orders", "SELECT 2;", vec![], "").unwrap();

        let first = cache.search("show all customers").unwrap();
        let second = cache.search("show all customers").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_add_rejects_empty_key() {
        let mut cache = hashing_cache(0.8);

        let result = cache.add("   ", "SELECT 1;", vec![], "");

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_add_is_all_or_nothing_on_embedding_failure() {
        let mut embedder = MockEmbedder::new();
        let mut calls = 0;
        embedder.expect_embed().returning(move |texts| {
            calls += 1;
            if calls == 1 {
                Ok(texts.iter().map(|_| Embedding::new(vec![1.0, 0.0])).collect())
            } else {
                Err(DomainError::embedding("mock", "model unavailable"))
            }
        });

        let mut cache = SemanticCache::with_defaults(Arc::new(embedder)).unwrap();

        cache.add("first", "SELECT 1;", vec![], "").unwrap();
        let result = cache.add("second", "SELECT 2;", vec![], "");

        assert!(matches!(result, Err(DomainError::EmbeddingFailure { .. })));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_add_is_all_or_nothing_on_dimension_mismatch() {
        let mut embedder = MockEmbedder::new();
        let mut calls = 0;
        embedder.expect_embed().returning(move |texts| {
            calls += 1;
            let width = if calls == 1 { 2 } else { 3 };
            Ok(texts.iter().map(|_| Embedding::new(vec![1.0; width])).collect())
        });

        let mut cache = SemanticCache::with_defaults(Arc::new(embedder)).unwrap();

        cache.add("first", "SELECT 1;", vec![], "").unwrap();
        let result = cache.add("second", "SELECT 2;", vec![], "");

        assert!(matches!(
            result,
            Err(DomainError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_add_sizes_index_without_dimension_lookup() {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .times(1)
            .returning(|texts| Ok(texts.iter().map(|_| Embedding::new(vec![0.6, 0.8])).collect()));
        embedder.expect_dimensions().times(0);

        let mut cache = SemanticCache::with_defaults(Arc::new(embedder)).unwrap();

        assert_eq!(cache.add("first", "SELECT 1;", vec![], "").unwrap(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_add_with_unlisted_remote_model_posts_once() {
        let url = "http://localhost:8080/v1/embeddings";
        let response = json!({"data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}]});
        let client = MockHttpClient::new().with_response(url, response);
        let embedder = Arc::new(OpenAiEmbedder::with_base_url(
            client,
            "key",
            "nomic-embed-text",
            "http://localhost:8080",
        ));
        let mut cache = SemanticCache::with_defaults(embedder.clone()).unwrap();

        cache.add("show all customers", "SELECT * FROM customers;", vec![], "").unwrap();

        assert_eq!(embedder.client().requests().len(), 1);
    }

    #[test]
    fn test_result_columns_keep_insertion_order() {
        let mut cache = hashing_cache(0.8);
        let row: ResultRow =
            serde_json::from_str(r#"{"name": "Alice", "city": "Paris", "id": 1}"#).unwrap();

        cache.add("q", "SELECT name, city, id FROM customers;", vec![row], "").unwrap();

        let hit = cache.search("q").unwrap().unwrap();
        let columns: Vec<&str> = hit.structured_result[0].keys().map(String::as_str).collect();

        assert_eq!(columns, vec!["name", "city", "id"]);
    }

    #[test]
    fn test_search_propagates_embedding_failure() {
        let mut embedder = MockEmbedder::new();
        let mut calls = 0;
        embedder.expect_embed().returning(move |texts| {
            calls += 1;
            if calls == 1 {
                Ok(texts.iter().map(|_| Embedding::new(vec![0.0, 1.0])).collect())
            } else {
                Err(DomainError::embedding("mock", "timeout"))
            }
        });

        let mut cache = SemanticCache::with_defaults(Arc::new(embedder)).unwrap();
        cache.add("first", "SELECT 1;", vec![], "").unwrap();

        assert!(cache.search("first").is_err());
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let mut cache = hashing_cache(0.8);
        cache
            .add("show all customers", "SELECT * FROM customers;", vec![], "")
            .unwrap();

        cache.search("show all customers").unwrap();
        cache.search("show all customers").unwrap();
        cache.search("total order amount per product").unwrap();

        let stats = cache.stats();

        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.avg_hit_similarity - 1.0).abs() < 1e-6);
    }
}
