//! Loads schema corpora from disk

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::domain::schema::{SchemaCorpus, TableSchema};
use crate::domain::DomainError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonSchemaDocument {
    Tables(Vec<TableSchema>),
    Wrapped { tables: Vec<TableSchema> },
}

#[derive(Debug, Deserialize)]
struct TomlSchemaDocument {
    #[serde(default)]
    tables: Vec<TableSchema>,
}

/// Load a schema corpus, choosing the format by file extension
///
/// `.json` holds an array of tables or `{"tables": [...]}`, `.toml` holds
/// `[[tables]]` entries, and anything else is read as one description per
/// line. An empty result is returned as-is.
pub fn load_schema_corpus(path: impl AsRef<Path>) -> Result<SchemaCorpus, DomainError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        DomainError::io(format!("Failed to read schema file {}: {}", path.display(), e))
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    let corpus = match extension.as_deref() {
        Some("json") => parse_json_schema(&content)?,
        Some("toml") => parse_toml_schema(&content)?,
        _ => SchemaCorpus::from_lines(&content),
    };

    debug!(path = %path.display(), tables = corpus.len(), "Loaded schema corpus");

    Ok(corpus)
}

pub fn parse_json_schema(content: &str) -> Result<SchemaCorpus, DomainError> {
    let document: JsonSchemaDocument = serde_json::from_str(content)
        .map_err(|e| DomainError::validation(format!("Invalid JSON schema file: {}", e)))?;

    let tables = match document {
        JsonSchemaDocument::Tables(tables) => tables,
        JsonSchemaDocument::Wrapped { tables } => tables,
    };

    Ok(SchemaCorpus::from_tables(&tables))
}

pub fn parse_toml_schema(content: &str) -> Result<SchemaCorpus, DomainError> {
    let document: TomlSchemaDocument = toml::from_str(content)
        .map_err(|e| DomainError::validation(format!("Invalid TOML schema file: {}", e)))?;

    Ok(SchemaCorpus::from_tables(&document.tables))
}
