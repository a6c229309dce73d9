//! OpenAI-compatible embedding backend

use serde::Deserialize;

use crate::domain::embedding::{embed_one, Embedder, Embedding, EmbeddingRequest, DIMENSION_SAMPLE};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Known OpenAI embedding models and their dimensions
const EMBEDDING_MODELS: &[(&str, usize)] = &[
    ("text-embedding-3-small", 1536),
    ("text-embedding-3-large", 3072),
    ("text-embedding-ada-002", 1536),
];

/// Embedder backed by an OpenAI-compatible `/v1/embeddings` endpoint
#[derive(Debug)]
pub struct OpenAiEmbedder<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
    dimensions: Option<usize>,
}

impl<C: HttpClientTrait> OpenAiEmbedder<C> {
    /// Create a new OpenAI embedder
    pub fn new(client: C, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, model, DEFAULT_OPENAI_BASE_URL)
    }

    /// Create an embedder for a custom OpenAI-compatible server
    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            model: model.into(),
            dimensions: None,
        }
    }

    /// Request shortened embeddings of the given size
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    #[cfg(test)]
    pub(crate) fn client(&self) -> &C {
        &self.client
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, texts: &[String]) -> Result<serde_json::Value, DomainError> {
        let mut request = EmbeddingRequest::new(self.model.as_str(), texts.to_vec());

        if let Some(dimensions) = self.dimensions {
            request = request.with_dimensions(dimensions);
        }

        serde_json::to_value(&request).map_err(|e| {
            DomainError::embedding("openai", format!("Failed to encode request: {}", e))
        })
    }

    fn parse_response(
        &self,
        json: serde_json::Value,
        expected: usize,
    ) -> Result<Vec<Embedding>, DomainError> {
        let response: OpenAiEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::embedding("openai", format!("Failed to parse embedding response: {}", e))
        })?;

        if response.data.len() != expected {
            return Err(DomainError::embedding(
                "openai",
                format!(
                    "Expected {} embeddings, got {}",
                    expected,
                    response.data.len()
                ),
            ));
        }

        let mut slots: Vec<Option<Embedding>> = vec![None; expected];

        for item in response.data {
            let slot = slots.get_mut(item.index).ok_or_else(|| {
                DomainError::embedding(
                    "openai",
                    format!("Embedding index {} out of range", item.index),
                )
            })?;

            if slot.replace(Embedding::new(item.embedding)).is_some() {
                return Err(DomainError::embedding(
                    "openai",
                    format!("Duplicate embedding index {}", item.index),
                ));
            }
        }

        // Every slot is filled: counts match and no index repeated
        Ok(slots.into_iter().flatten().collect())
    }
}

impl<C: HttpClientTrait> Embedder for OpenAiEmbedder<C> {
    fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = self.build_request(texts)?;
        let response = self
            .client
            .post_json(&self.embeddings_url(), self.headers(), &body)?;

        self.parse_response(response, texts.len())
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn dimensions(&self) -> Result<usize, DomainError> {
        let known = self.dimensions.or_else(|| {
            EMBEDDING_MODELS
                .iter()
                .find(|(name, _)| *name == self.model)
                .map(|(_, dims)| *dims)
        });

        match known {
            Some(dimensions) => Ok(dimensions),
            None => Ok(embed_one(self, DIMENSION_SAMPLE)?.dimensions()),
        }
    }
}

// OpenAI API types for embeddings

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}
