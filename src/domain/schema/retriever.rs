//! Top-k schema snippet retrieval

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::SchemaCorpus;
use crate::domain::embedding::{embed_one, Embedder};
use crate::domain::vector_index::VectorIndex;
use crate::domain::DomainError;

/// Configuration for schema retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRetrieverConfig {
    /// Number of table descriptions returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    2
}

impl Default for SchemaRetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl SchemaRetrieverConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// A retrieved corpus entry with its squared distance to the query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedSnippet {
    pub ordinal: usize,
    pub text: String,
    pub distance: f32,
}

/// Retrieves the table descriptions closest to a question
///
/// The corpus is embedded once at construction; the index never changes
/// afterwards.
#[derive(Debug)]
pub struct SchemaRetriever {
    embedder: Arc<dyn Embedder>,
    corpus: SchemaCorpus,
    index: VectorIndex,
    config: SchemaRetrieverConfig,
}

impl SchemaRetriever {
    /// Embed and index the corpus with the default configuration
    pub fn new(corpus: SchemaCorpus, embedder: Arc<dyn Embedder>) -> Result<Self, DomainError> {
        Self::with_config(corpus, embedder, SchemaRetrieverConfig::default())
    }

    pub fn with_config(
        corpus: SchemaCorpus,
        embedder: Arc<dyn Embedder>,
        config: SchemaRetrieverConfig,
    ) -> Result<Self, DomainError> {
        if corpus.is_empty() {
            return Err(DomainError::empty_corpus(
                "Schema retriever requires at least one table description",
            ));
        }

        let embeddings = embedder.embed(corpus.entries())?;

        if embeddings.len() != corpus.len() {
            return Err(DomainError::embedding(
                embedder.provider_name(),
                format!(
                    "Expected {} embeddings for schema corpus, got {}",
                    corpus.len(),
                    embeddings.len()
                ),
            ));
        }

        let mut index = VectorIndex::new(embedder.dimensions()?)?;
        index.add(embeddings)?;

        info!(
            tables = corpus.len(),
            dimensions = index.dimensions(),
            "Schema retriever initialized"
        );

        Ok(Self {
            embedder,
            corpus,
            index,
            config,
        })
    }

    pub fn corpus(&self) -> &SchemaCorpus {
        &self.corpus
    }

    pub fn config(&self) -> &SchemaRetrieverConfig {
        &self.config
    }

    /// Corpus entries closest to `query_text`, nearest first
    ///
    /// Returns every entry when `top_k` exceeds the corpus size.
    pub fn retrieve(&self, query_text: &str, top_k: usize) -> Result<Vec<String>, DomainError> {
        Ok(self
            .retrieve_scored(query_text, top_k)?
            .into_iter()
            .map(|snippet| snippet.text)
            .collect())
    }

    /// `retrieve` using the configured `top_k`
    pub fn retrieve_with_defaults(&self, query_text: &str) -> Result<Vec<String>, DomainError> {
        self.retrieve(query_text, self.config.top_k)
    }

    /// Like `retrieve`, keeping ordinals and distances
    pub fn retrieve_scored(
        &self,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedSnippet>, DomainError> {
        let query = embed_one(self.embedder.as_ref(), query_text)?;
        let neighbors = self.index.search(&query, top_k)?;

        let snippets = neighbors
            .into_iter()
            .map(|neighbor| {
                let text = self.corpus.get(neighbor.ordinal).ok_or_else(|| {
                    DomainError::internal(format!(
                        "Index ordinal {} outside schema corpus of {} entries",
                        neighbor.ordinal,
                        self.corpus.len()
                    ))
                })?;

                Ok(RetrievedSnippet {
                    ordinal: neighbor.ordinal,
                    text: text.to_string(),
                    distance: neighbor.distance,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        debug!(top_k, returned = snippets.len(), "Retrieved schema snippets");

        Ok(snippets)
    }
}
