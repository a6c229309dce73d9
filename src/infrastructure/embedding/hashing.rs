//! Local feature-hashing embedder

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::domain::embedding::{Embedder, Embedding};
use crate::domain::DomainError;

/// Default output dimensionality
pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9a-z]+").unwrap());

/// Deterministic bag-of-words embedder using signed feature hashing
///
/// Each lowercase alphanumeric token is hashed with SHA-256 into one of
/// `dimensions` buckets with a ±1 sign, and the result is L2-normalised.
/// Texts sharing tokens land close together; texts with no tokens embed to
/// the zero vector. Output is stable across processes and platforms.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self, DomainError> {
        if dimensions == 0 {
            return Err(DomainError::invalid_dimension(dimensions));
        }

        Ok(Self { dimensions })
    }

    fn embed_text(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();

        for token in TOKEN_PATTERN.find_iter(&lowered) {
            let (bucket, sign) = self.bucket(token.as_str());
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        Embedding::new(vector)
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let digest = Sha256::digest(token.as_bytes());

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(head) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };

        (bucket, sign)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_HASHING_DIMENSIONS,
        }
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    fn provider_name(&self) -> &'static str {
        "hashing"
    }

    fn dimensions(&self) -> Result<usize, DomainError> {
        Ok(self.dimensions)
    }
}
