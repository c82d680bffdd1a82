//! Search queries

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::message::Message;

/// Reasons a raw input cannot become a query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Query prompt is empty")]
    EmptyPrompt,
}

/// A submitted search query. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Query {
    #[serde(skip)]
    id: Uuid,

    prompt: String,

    history: Vec<Message>,

    #[serde(skip)]
    submitted_at: DateTime<Utc>,
}

impl Query {
    /// Build a query from raw user input and the conversation so far
    ///
    /// The prompt is trimmed and must be non-empty. History keeps only text
    /// content; messages without any text are dropped.
    pub fn new(input: &str, history: &[Message]) -> Result<Self, QueryError> {
        let prompt = input.trim();
        debug!(prompt_len = prompt.len(), history_len = history.len(), "Query::new: called");
        if prompt.is_empty() {
            debug!("Query::new: empty prompt");
            return Err(QueryError::EmptyPrompt);
        }

        Ok(Self {
            id: Uuid::now_v7(),
            prompt: prompt.to_string(),
            history: text_only_history(history),
            submitted_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// History encoded as a JSON array, as carried on the stream URL
    pub fn history_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.history)
    }
}

/// Restrict a conversation to its text content
pub fn text_only_history(messages: &[Message]) -> Vec<Message> {
    messages.iter().filter_map(Message::text_only).collect()
}
