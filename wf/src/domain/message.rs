//! Conversation messages
//!
//! A message is an ordered list of typed content items. Once appended to a
//! conversation a message is never mutated; later edits produce new items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::travel::{FlightResult, HotelResult};

/// A source reference attached to assistant text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CitationWire")]
pub struct Citation {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Citation {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            text: None,
            source: None,
        }
    }
}

/// Citations arrive either as bare URLs or as full objects
#[derive(Deserialize)]
#[serde(untagged)]
enum CitationWire {
    Url(String),
    Full {
        url: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        source: Option<String>,
    },
}

impl From<CitationWire> for Citation {
    fn from(wire: CitationWire) -> Self {
        match wire {
            CitationWire::Url(url) => Citation::url(url),
            CitationWire::Full {
                url,
                title,
                text,
                source,
            } => Citation {
                url,
                title,
                text,
                source,
            },
        }
    }
}

/// One typed piece of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        citations: Vec<Citation>,
    },
    Flight {
        content: FlightResult,
    },
    Hotel {
        content: HotelResult,
    },
}

impl ContentItem {
    /// Create a text item without citations
    pub fn text(content: impl Into<String>) -> Self {
        ContentItem::Text {
            content: content.into(),
            citations: Vec::new(),
        }
    }

    /// Text payload, if this is a text item
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentItem::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ContentItem::Text { .. })
    }

    /// Wire name of the item's type
    pub fn kind(&self) -> &'static str {
        match self {
            ContentItem::Text { .. } => "text",
            ContentItem::Flight { .. } => "flight",
            ContentItem::Hotel { .. } => "hotel",
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub contents: Vec<ContentItem>,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a user message with a single text item
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            contents: vec![ContentItem::text(text)],
            is_user: true,
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant message with a single text item
    pub fn assistant(text: impl Into<String>) -> Self {
        debug!("Message::assistant: called");
        Self::assistant_item(ContentItem::text(text))
    }

    /// Create an assistant message holding one content item
    pub fn assistant_item(item: ContentItem) -> Self {
        Self {
            contents: vec![item],
            is_user: false,
            timestamp: Utc::now(),
        }
    }

    /// All text items joined with newlines
    pub fn text(&self) -> String {
        self.contents
            .iter()
            .filter_map(ContentItem::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Copy of this message with only its text items, or None if it has none
    pub fn text_only(&self) -> Option<Message> {
        let contents: Vec<ContentItem> = self.contents.iter().filter(|c| c.is_text()).cloned().collect();
        if contents.is_empty() {
            return None;
        }
        Some(Message {
            contents,
            is_user: self.is_user,
            timestamp: self.timestamp,
        })
    }
}
