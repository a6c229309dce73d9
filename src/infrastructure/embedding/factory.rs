//! Embedder factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use super::hashing::{HashingEmbedder, DEFAULT_HASHING_DIMENSIONS};
use super::openai::OpenAiEmbedder;
use crate::domain::embedding::Embedder;
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClient;

/// Supported embedding backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum EmbedderType {
    /// Local feature-hashing embedder, no network access
    #[default]
    Hashing,
    /// OpenAI-compatible embeddings endpoint
    OpenAi,
}

impl std::fmt::Display for EmbedderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbedderType::Hashing => write!(f, "hashing"),
            EmbedderType::OpenAi => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for EmbedderType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hashing" | "hash" | "local" => Ok(EmbedderType::Hashing),
            "openai" | "open_ai" => Ok(EmbedderType::OpenAi),
            _ => Err(DomainError::configuration(format!(
                "Unknown embedder type: {}. Valid types: hashing, openai",
                s
            ))),
        }
    }
}

impl TryFrom<String> for EmbedderType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Configuration for the embedder factory
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedderConfig {
    #[serde(default)]
    pub provider: EmbedderType,
    /// Output size of the hashing embedder, or requested size for OpenAI
    #[serde(default)]
    pub dimensions: Option<usize>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: EmbedderType::default(),
            dimensions: None,
            model: default_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbedderConfig {
    /// Configuration for the local hashing embedder
    pub fn hashing(dimensions: usize) -> Self {
        Self {
            provider: EmbedderType::Hashing,
            dimensions: Some(dimensions),
            ..Default::default()
        }
    }

    /// Configuration for an OpenAI-compatible embedder
    pub fn openai(model: impl Into<String>) -> Self {
        Self {
            provider: EmbedderType::OpenAi,
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = name.into();
        self
    }
}

/// Build the configured embedder
pub fn create_embedder(config: &EmbedderConfig) -> Result<Arc<dyn Embedder>, DomainError> {
    info!(provider = %config.provider, "Creating embedder");

    match config.provider {
        EmbedderType::Hashing => {
            let dimensions = config.dimensions.unwrap_or(DEFAULT_HASHING_DIMENSIONS);
            Ok(Arc::new(HashingEmbedder::new(dimensions)?))
        }
        EmbedderType::OpenAi => create_openai_embedder(config),
    }
}

fn create_openai_embedder(config: &EmbedderConfig) -> Result<Arc<dyn Embedder>, DomainError> {
    let api_key = std::env::var(&config.api_key_env).map_err(|_| {
        DomainError::configuration(format!(
            "Environment variable {} is required for the openai embedder",
            config.api_key_env
        ))
    })?;

    let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;

    let embedder = match &config.base_url {
        Some(base_url) => {
            OpenAiEmbedder::with_base_url(client, api_key, config.model.as_str(), base_url.as_str())
        }
        None => OpenAiEmbedder::new(client, api_key, config.model.as_str()),
    };

    let embedder = match config.dimensions {
        Some(0) => return Err(DomainError::invalid_dimension(0)),
        Some(dimensions) => embedder.with_dimensions(dimensions),
        None => embedder,
    };

    info!(model = embedder.model(), "Using OpenAI-compatible embedder");

    Ok(Arc::new(embedder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_type_display() {
        assert_eq!(EmbedderType::Hashing.to_string(), "hashing");
        assert_eq!(EmbedderType::OpenAi.to_string(), "openai");
    }

    #[test]
    fn test_embedder_type_from_str() {
        assert_eq!("hashing".parse::<EmbedderType>().unwrap(), EmbedderType::Hashing);
        assert_eq!("LOCAL".parse::<EmbedderType>().unwrap(), EmbedderType::Hashing);
        assert_eq!("OpenAI".parse::<EmbedderType>().unwrap(), EmbedderType::OpenAi);

        let err = "faiss".parse::<EmbedderType>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_config_deserializes_provider_name() {
        let config: EmbedderConfig =
            serde_json::from_value(serde_json::json!({"provider": "openai"})).unwrap();

        assert_eq!(config.provider, EmbedderType::OpenAi);
        assert_eq!(config.model, "text-embedding-3-small");
        assert_eq!(config.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_config_rejects_unknown_provider() {
        let result: Result<EmbedderConfig, _> =
            serde_json::from_value(serde_json::json!({"provider": "faiss"}));

        assert!(result.is_err());
    }

    #[test]
    fn test_create_default_hashing_embedder() {
        let embedder = create_embedder(&EmbedderConfig::default()).unwrap();

        assert_eq!(embedder.provider_name(), "hashing");
        assert_eq!(embedder.dimensions().unwrap(), DEFAULT_HASHING_DIMENSIONS);
    }

    #[test]
    fn test_create_hashing_embedder_with_dimensions() {
        let embedder = create_embedder(&EmbedderConfig::hashing(64)).unwrap();

        assert_eq!(embedder.dimensions().unwrap(), 64);
    }

    #[test]
    fn test_create_hashing_embedder_zero_dimensions() {
        let result = create_embedder(&EmbedderConfig::hashing(0));

        assert!(matches!(result, Err(DomainError::InvalidDimension { .. })));
    }

    #[test]
    fn test_create_openai_embedder_requires_api_key() {
        let config = EmbedderConfig::openai("text-embedding-3-small")
            .with_api_key_env("SEMANTIC_QUERY_CACHE_TEST_MISSING_KEY");

        let result = create_embedder(&config);

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
