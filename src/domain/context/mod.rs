//! Conversational context used to enrich follow-up questions

mod manager;

pub use manager::{ContextConfig, ContextManager, ContextTurn};
