//! Cache entry and lookup result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One result row: column name to value
pub type ResultRow = serde_json::Map<String, serde_json::Value>;

/// A cached query translation and its result payloads
///
/// Entries are created by `SemanticCache::add` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The exact enriched text that was embedded
    key_text: String,
    /// The generated query string
    sql: String,
    /// Result rows, one mapping per row
    structured_result: Vec<ResultRow>,
    /// Preformatted tabular rendering of the same rows
    display_result: String,
    created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(
        key_text: impl Into<String>,
        sql: impl Into<String>,
        structured_result: Vec<ResultRow>,
        display_result: impl Into<String>,
    ) -> Self {
        Self {
            key_text: key_text.into(),
            sql: sql.into(),
            structured_result,
            display_result: display_result.into(),
            created_at: Utc::now(),
        }
    }

    pub fn key_text(&self) -> &str {
        &self.key_text
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn structured_result(&self) -> &[ResultRow] {
        &self.structured_result
    }

    pub fn display_result(&self) -> &str {
        &self.display_result
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A successful cache lookup: a copy of the matched entry's payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheHit {
    /// Ordinal of the matched entry
    pub ordinal: usize,
    /// Similarity score in (0, 1]
    pub similarity: f32,
    pub sql: String,
    pub structured_result: Vec<ResultRow>,
    pub display_result: String,
    /// When the matched entry was stored
    pub cached_at: DateTime<Utc>,
}

impl CacheHit {
    pub(crate) fn from_entry(ordinal: usize, similarity: f32, entry: &CacheEntry) -> Self {
        Self {
            ordinal,
            similarity,
            sql: entry.sql().to_string(),
            structured_result: entry.structured_result().to_vec(),
            display_result: entry.display_result().to_string(),
            cached_at: entry.created_at(),
        }
    }
}

/// Statistics for the semantic cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticCacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Total cache hits
    pub hits: u64,
    /// Total cache misses
    pub misses: u64,
    /// Average similarity of hits
    pub avg_hit_similarity: f32,
}

impl SemanticCacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;

        if total == 0 {
            return 0.0;
        }

        self.hits as f32 / total as f32
    }
}
