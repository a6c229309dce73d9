//! Retrieve command - prints the schema descriptions closest to a question

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::domain::schema::{RetrievedSnippet, SchemaRetriever};
use crate::infrastructure::embedding::create_embedder;
use crate::infrastructure::schema_loader::load_schema_corpus;

/// Arguments for the retrieve command
#[derive(Args, Clone)]
pub struct RetrieveArgs {
    /// Schema file (.json, .toml, or one description per line)
    #[arg(long, short)]
    pub schema: PathBuf,

    /// Number of descriptions to return (overrides config)
    #[arg(long, short = 'k')]
    pub top_k: Option<usize>,

    /// Print JSON with ordinals and distances instead of plain text
    #[arg(long)]
    pub json: bool,

    /// The question to retrieve schema context for
    pub question: String,
}

/// Run the retrieve command
pub fn run(args: RetrieveArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let embedder = create_embedder(&config.embedder)?;
    let corpus = load_schema_corpus(&args.schema)?;
    let retriever = SchemaRetriever::with_config(corpus, embedder, config.retriever.clone())?;

    let top_k = args.top_k.unwrap_or(retriever.config().top_k);
    let snippets = retriever.retrieve_scored(&args.question, top_k)?;

    info!(top_k, returned = snippets.len(), "Retrieval complete");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snippets)?);
    } else {
        print!("{}", render_snippets(&snippets));
    }

    Ok(())
}

fn render_snippets(snippets: &[RetrievedSnippet]) -> String {
    snippets
        .iter()
        .map(|snippet| format!("{}\n", snippet.text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_snippets_one_per_line() {
        let snippets = vec![
            RetrievedSnippet {
                ordinal: 1,
                text: "Table orders: id".to_string(),
                distance: 0.5,
            },
            RetrievedSnippet {
                ordinal: 0,
                text: "Table customers: id".to_string(),
                distance: 1.5,
            },
        ];

        assert_eq!(
            render_snippets(&snippets),
            "Table orders: id\nTable customers: id\n"
        );
    }

    #[test]
    fn test_render_no_snippets() {
        assert_eq!(render_snippets(&[]), "");
    }
}
