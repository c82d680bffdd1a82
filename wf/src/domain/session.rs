//! Chat sessions and the session context handed to the orchestrator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::message::{ContentItem, Message};

/// Title used until a session has a user message
pub const DEFAULT_TITLE: &str = "New Chat";

/// Maximum title length in characters before truncation
const TITLE_MAX_CHARS: usize = 30;

/// Identity of the conversation a query belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// A persisted conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create an empty session with a fresh id
    pub fn new() -> Self {
        Self::with_id(Uuid::now_v7().to_string())
    }

    /// Create an empty session with the given id
    pub fn with_id(id: impl Into<String>) -> Self {
        let id = id.into();
        debug!(%id, "ChatSession::with_id: called");
        let now = Utc::now();
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append messages in order and refresh the title
    pub fn append(&mut self, messages: Vec<Message>) {
        self.messages.extend(messages);
        self.title = generate_chat_title(&self.messages);
        self.updated_at = Utc::now();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a title from the first user message
pub fn generate_chat_title(messages: &[Message]) -> String {
    let Some(first) = messages.iter().find(|m| m.is_user).and_then(|m| m.contents.first()) else {
        return DEFAULT_TITLE.to_string();
    };

    let text = match first {
        ContentItem::Text { content, .. } => content.as_str(),
        _ => return DEFAULT_TITLE.to_string(),
    };

    let head: String = text.chars().take(TITLE_MAX_CHARS).collect();
    let title = head.trim();
    if text.chars().count() > TITLE_MAX_CHARS {
        format!("{}...", title)
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_defaults_without_user_message() {
        assert_eq!(generate_chat_title(&[]), "New Chat");
        assert_eq!(generate_chat_title(&[Message::assistant("hello")]), "New Chat");
    }

    #[test]
    fn test_short_title_kept_whole() {
        let messages = vec![Message::user("Flights to Tokyo")];
        assert_eq!(generate_chat_title(&messages), "Flights to Tokyo");
    }

    #[test]
    fn test_long_title_truncated_with_ellipsis() {
        let messages = vec![Message::user("Find me a boutique hotel near the old town in Prague")];
        let title = generate_chat_title(&messages);

        assert!(title.ends_with("..."));
        assert_eq!(title, "Find me a boutique hotel near...");
    }

    #[test]
    fn test_title_truncation_is_char_safe() {
        let messages = vec![Message::user("ホテル".repeat(20))];
        let title = generate_chat_title(&messages);
        assert_eq!(title.chars().count(), 33);
    }

    #[test]
    fn test_append_updates_title_and_timestamp() {
        let mut session = ChatSession::with_id("s-1");
        let created = session.updated_at;
        session.append(vec![Message::user("Weekend in Lisbon")]);

        assert_eq!(session.title, "Weekend in Lisbon");
        assert!(session.updated_at >= created);
        assert_eq!(session.messages.len(), 1);
    }
}
