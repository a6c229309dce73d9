//! Semantic Query Cache
//!
//! Embedding-based lookup for a natural-language-to-SQL pipeline:
//! - Semantic cache of generated queries and their results, keyed by question
//! - Top-k retrieval of the table descriptions relevant to a question
//! - Conversational context used to enrich follow-up questions
//! - Pluggable embedders (local feature hashing, OpenAI-compatible HTTP)

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::DomainError;
