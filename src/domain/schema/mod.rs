//! Schema corpus and retrieval of the table descriptions relevant to a question

mod corpus;
mod retriever;

pub use corpus::{ColumnSchema, SchemaCorpus, TableSchema};
pub use retriever::{RetrievedSnippet, SchemaRetriever, SchemaRetrieverConfig};
