//! Rolling history of answered questions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for prompt enrichment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Number of most recent turns included in an enriched prompt
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_window() -> usize {
    3
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

impl ContextConfig {
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }
}

/// One answered question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextTurn {
    pub question: String,
    pub sql: String,
    /// Display text of the result
    pub result: String,
    pub recorded_at: DateTime<Utc>,
}

/// Tracks previous turns and builds enriched prompts from them
///
/// The enriched prompt is the text both the cache and the schema retriever
/// key off, so it must be built the same way at lookup and insertion time.
#[derive(Debug, Clone, Default)]
pub struct ContextManager {
    history: Vec<ContextTurn>,
    config: ContextConfig,
}

impl ContextManager {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            history: Vec::new(),
            config,
        }
    }

    /// Record an answered question
    pub fn add_entry(
        &mut self,
        question: impl Into<String>,
        sql: impl Into<String>,
        result: impl Into<String>,
    ) {
        self.history.push(ContextTurn {
            question: question.into(),
            sql: sql.into(),
            result: result.into(),
            recorded_at: Utc::now(),
        });
    }

    /// Most recent turn, if any
    pub fn last(&self) -> Option<&ContextTurn> {
        self.history.last()
    }

    pub fn history(&self) -> &[ContextTurn] {
        &self.history
    }

    /// Prefix `question` with the last `window` turns
    ///
    /// Without history the question is returned unchanged.
    pub fn build_context_prompt(&self, question: &str) -> String {
        let start = self.history.len().saturating_sub(self.config.window);
        let recent = &self.history[start..];

        if recent.is_empty() {
            return question.to_string();
        }

        let context = recent
            .iter()
            .map(|turn| {
                format!(
                    "Q: {}\nSQL: {}\nResult: {}\n",
                    turn.question, turn.sql, turn.result
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Previous conversation:\n{}\nFollow-up question: {}",
            context, question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_history_is_question() {
        let context = ContextManager::default();

        assert_eq!(
            context.build_context_prompt("show all customers"),
            "show all customers"
        );
        assert!(context.last().is_none());
    }

    #[test]
    fn test_prompt_includes_previous_turn() {
        let mut context = ContextManager::default();
        context.add_entry("show all customers", "SELECT * FROM customers;", "3 rows");

        let prompt = context.build_context_prompt("which of them live in New York?");

        assert_eq!(
            prompt,
            "Previous conversation:\n\
             Q: show all customers\n\
             SQL: SELECT * FROM customers;\n\
             Result: 3 rows\n\
             \n\
             Follow-up question: which of them live in New York?"
        );
    }

    #[test]
    fn test_prompt_uses_only_last_window_turns() {
        let mut context = ContextManager::new(ContextConfig::default().with_window(2));
        context.add_entry("q1", "SELECT 1;", "1");
        context.add_entry("q2", "SELECT 2;", "2");
        context.add_entry("q3", "SELECT 3;", "3");

        let prompt = context.build_context_prompt("q4");

        assert!(!prompt.contains("Q: q1"));
        assert!(prompt.contains("Q: q2"));
        assert!(prompt.contains("Q: q3"));
        assert!(prompt.find("Q: q2") < prompt.find("Q: q3"));
        assert!(prompt.ends_with("Follow-up question: q4"));
    }

    #[test]
    fn test_zero_window_ignores_history() {
        let mut context = ContextManager::new(ContextConfig::default().with_window(0));
        context.add_entry("q1", "SELECT 1;", "1");

        assert_eq!(context.build_context_prompt("q2"), "q2");
    }

    #[test]
    fn test_last_returns_latest_turn() {
        let mut context = ContextManager::default();
        context.add_entry("q1", "SELECT 1;", "1");
        context.add_entry("q2", "SELECT 2;", "2");

        assert_eq!(context.last().unwrap().question, "q2");
        assert_eq!(context.history().len(), 2);
    }
}
