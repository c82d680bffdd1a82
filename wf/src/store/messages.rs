//! Conversation store messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{ChatSession, Message};

/// Errors from conversation store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Invalid session id: {0:?}")]
    InvalidId(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Channel error")]
    ChannelError,
}

/// Response from store operations
pub type StoreResponse<T> = Result<T, StoreError>;

/// Commands sent to the conversation store actor
#[derive(Debug)]
pub enum StoreCommand {
    CreateSession {
        reply: oneshot::Sender<StoreResponse<ChatSession>>,
    },
    EnsureSession {
        id: String,
        reply: oneshot::Sender<StoreResponse<ChatSession>>,
    },
    GetSession {
        id: String,
        reply: oneshot::Sender<StoreResponse<Option<ChatSession>>>,
    },
    ListSessions {
        reply: oneshot::Sender<StoreResponse<Vec<ChatSession>>>,
    },
    Messages {
        id: String,
        reply: oneshot::Sender<StoreResponse<Vec<Message>>>,
    },

    /// Append messages as one update, creating the session if needed
    Append {
        id: String,
        messages: Vec<Message>,
        reply: oneshot::Sender<StoreResponse<usize>>,
    },
    DeleteSession {
        id: String,
        reply: oneshot::Sender<StoreResponse<bool>>,
    },

    Shutdown,
}
