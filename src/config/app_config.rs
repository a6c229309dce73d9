use std::path::Path;

use serde::Deserialize;

use crate::domain::context::ContextConfig;
use crate::domain::schema::SchemaRetrieverConfig;
use crate::domain::semantic_cache::SemanticCacheConfig;
use crate::infrastructure::embedding::EmbedderConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub embedder: EmbedderConfig,
    #[serde(default)]
    pub cache: SemanticCacheConfig,
    #[serde(default)]
    pub retriever: SchemaRetrieverConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Layer `config/default`, `config/local` and `APP__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// Like `load`, reading `default` and `local` from `dir`
    ///
    /// Absent files are skipped; a file that exists but does not parse fails.
    pub fn load_from(dir: &Path) -> Result<Self, config::ConfigError> {
        let default = dir.join("default");
        let local = dir.join("local");

        let config = config::Config::builder()
            .add_source(config::File::with_name(&default.to_string_lossy()).required(false))
            .add_source(config::File::with_name(&local.to_string_lossy()).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
