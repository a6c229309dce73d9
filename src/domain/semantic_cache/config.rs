//! Semantic cache configuration

use serde::{Deserialize, Serialize};

/// Configuration for semantic caching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Whether callers should consult the cache at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Similarity threshold for cache hits (0.0 to 1.0)
    /// Higher values require more similar queries
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Number of characters of the key text shown in log lines
    #[serde(default = "default_log_preview_chars")]
    pub log_preview_chars: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_similarity_threshold() -> f32 {
    0.80
}

fn default_log_preview_chars() -> usize {
    60
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            similarity_threshold: default_similarity_threshold(),
            log_preview_chars: default_log_preview_chars(),
        }
    }
}

impl SemanticCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether caching is enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the similarity threshold
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the log preview length
    pub fn with_log_preview_chars(mut self, chars: usize) -> Self {
        self.log_preview_chars = chars;
        self
    }
}
