//! Replay command - runs a transcript through context, cache and retriever
//!
//! Each transcript turn carries a question together with the SQL and
//! results a translator produced for it. Replaying shows which turns the
//! semantic cache would have answered and which schema descriptions would
//! have been retrieved for the rest.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::domain::context::ContextManager;
use crate::domain::embedding::Embedder;
use crate::domain::schema::{RetrievedSnippet, SchemaCorpus, SchemaRetriever};
use crate::domain::semantic_cache::{ResultRow, SemanticCache, SemanticCacheStats};
use crate::domain::DomainError;
use crate::infrastructure::embedding::create_embedder;
use crate::infrastructure::schema_loader::load_schema_corpus;

/// Arguments for the replay command
#[derive(Args, Clone)]
pub struct ReplayArgs {
    /// Schema file (.json, .toml, or one description per line)
    #[arg(long, short)]
    pub schema: PathBuf,

    /// Transcript file: JSON array of {question, sql, rows, display}
    #[arg(long, short)]
    pub transcript: PathBuf,

    /// Similarity threshold for cache hits, between 0 and 1 (overrides config)
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f32>,

    /// Bypass the cache entirely
    #[arg(long)]
    pub no_cache: bool,
}

/// One answered question in a transcript
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptTurn {
    pub question: String,
    pub sql: String,
    #[serde(default)]
    pub rows: Vec<ResultRow>,
    #[serde(default)]
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnOutcome {
    Hit,
    Miss,
    Bypassed,
}

/// What happened to one transcript turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub question: String,
    /// Enriched text used as cache key and retrieval query
    pub prompt: String,
    pub outcome: TurnOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub snippets: Vec<RetrievedSnippet>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub turns: Vec<TurnReport>,
    pub cache: SemanticCacheStats,
    pub hit_rate: f32,
}

/// Context, cache and retriever wired together the way a query pipeline uses them
#[derive(Debug)]
pub struct ReplaySession {
    context: ContextManager,
    cache: SemanticCache,
    retriever: SchemaRetriever,
}

impl ReplaySession {
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn Embedder>,
        corpus: SchemaCorpus,
    ) -> Result<Self, DomainError> {
        let cache = SemanticCache::new(embedder.clone(), config.cache.clone())?;
        let retriever = SchemaRetriever::with_config(corpus, embedder, config.retriever.clone())?;

        info!(
            cache_enabled = cache.config().enabled,
            threshold = cache.similarity_threshold(),
            top_k = retriever.config().top_k,
            "Replay session ready"
        );

        Ok(Self {
            context: ContextManager::new(config.context.clone()),
            cache,
            retriever,
        })
    }

    /// Process one turn: lookup, retrieval on a miss, then insertion
    pub fn process(&mut self, turn: TranscriptTurn) -> Result<TurnReport, DomainError> {
        let prompt = self.context.build_context_prompt(&turn.question);

        let cache_enabled = self.cache.config().enabled;

        if cache_enabled {
            if let Some(hit) = self.cache.search(&prompt)? {
                self.context
                    .add_entry(turn.question.as_str(), hit.sql.as_str(), hit.display_result.as_str());

                return Ok(TurnReport {
                    question: turn.question,
                    prompt,
                    outcome: TurnOutcome::Hit,
                    similarity: Some(hit.similarity),
                    cached_sql: Some(hit.sql),
                    cached_at: Some(hit.cached_at),
                    snippets: Vec::new(),
                });
            }
        }

        let top_k = self.retriever.config().top_k;
        let snippets = self.retriever.retrieve_scored(&prompt, top_k)?;

        let outcome = if cache_enabled {
            self.cache
                .add(prompt.as_str(), turn.sql.as_str(), turn.rows, turn.display.as_str())?;
            TurnOutcome::Miss
        } else {
            debug!("Cache disabled, skipping lookup and insertion");
            TurnOutcome::Bypassed
        };

        self.context.add_entry(turn.question.as_str(), turn.sql, turn.display);

        Ok(TurnReport {
            question: turn.question,
            prompt,
            outcome,
            similarity: None,
            cached_sql: None,
            cached_at: None,
            snippets,
        })
    }

    pub fn replay(
        &mut self,
        transcript: Vec<TranscriptTurn>,
    ) -> Result<ReplayReport, DomainError> {
        let turns = transcript
            .into_iter()
            .map(|turn| self.process(turn))
            .collect::<Result<Vec<_>, _>>()?;

        let cache = self.cache.stats();
        let hit_rate = cache.hit_rate();

        Ok(ReplayReport {
            turns,
            cache,
            hit_rate,
        })
    }
}

/// Parse a `--threshold` value, rejecting anything outside [0, 1]
fn parse_threshold(value: &str) -> Result<f32, String> {
    let threshold: f32 = value
        .parse()
        .map_err(|_| format!("`{}` is not a number", value))?;

    if !(0.0..=1.0).contains(&threshold) {
        return Err(format!("threshold must be between 0 and 1, got {}", threshold));
    }

    Ok(threshold)
}

pub fn parse_transcript(content: &str) -> Result<Vec<TranscriptTurn>, DomainError> {
    serde_json::from_str(content)
        .map_err(|e| DomainError::validation(format!("Invalid transcript: {}", e)))
}

/// Run the replay command
pub fn run(args: ReplayArgs) -> anyhow::Result<()> {
    let mut config = super::bootstrap()?;

    if let Some(threshold) = args.threshold {
        config.cache.similarity_threshold = threshold;
    }
    if args.no_cache {
        config.cache = config.cache.with_enabled(false);
    }

    let embedder = create_embedder(&config.embedder)?;
    let corpus = load_schema_corpus(&args.schema)?;
    let content = std::fs::read_to_string(&args.transcript)?;
    let transcript = parse_transcript(&content)?;

    let mut session = ReplaySession::new(&config, embedder, corpus)?;
    let report = session.replay(transcript)?;

    info!(
        turns = report.turns.len(),
        hits = report.cache.hits,
        misses = report.cache.misses,
        "Replay complete"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
