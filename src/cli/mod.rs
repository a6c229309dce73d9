//! CLI module for the semantic query cache
//!
//! Provides subcommands:
//! - `retrieve`: top-k schema descriptions for a single question
//! - `replay`: run a transcript through context, cache and retriever

pub mod replay;
pub mod retrieve;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Semantic Query Cache - embedding-based cache and schema retrieval
#[derive(Parser)]
#[command(name = "semantic-query-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the schema descriptions closest to a question
    Retrieve(retrieve::RetrieveArgs),

    /// Replay a transcript of answered questions and report cache behaviour
    Replay(replay::ReplayArgs),
}

/// Load `.env`, configuration and logging shared by every subcommand
///
/// Missing config files fall back to defaults; a file that exists but does
/// not parse is an error.
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    Ok(config)
}
