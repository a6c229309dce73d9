//! Schema corpus: one description string per table

use serde::{Deserialize, Serialize};

/// A column in a table description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type, e.g. `INTEGER`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
        }
    }

    pub fn with_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

/// A table and its ordered columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    /// Render as `Table <name>: <col> (<TYPE>), ...`
    pub fn describe(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| match &column.data_type {
                Some(data_type) => format!("{} ({})", column.name, data_type),
                None => column.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!("Table {}: {}", self.name, columns)
    }
}

/// Ordered, immutable set of schema descriptions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaCorpus {
    entries: Vec<String>,
}

impl SchemaCorpus {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Build from structured table descriptions, preserving table order
    pub fn from_tables(tables: &[TableSchema]) -> Self {
        Self::new(tables.iter().map(TableSchema::describe).collect())
    }

    /// Build from text with one description per line; blank lines are skipped
    pub fn from_lines(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn get(&self, ordinal: usize) -> Option<&str> {
        self.entries.get(ordinal).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<String> for SchemaCorpus {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
