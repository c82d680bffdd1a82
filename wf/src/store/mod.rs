//! Conversation storage with actor pattern
//!
//! ConversationStore owns the chat sessions and processes messages via
//! channels, giving every caller one ordered write path per session.

mod manager;
mod messages;
mod persistence;

pub use manager::ConversationStore;
pub use messages::{StoreCommand, StoreError, StoreResponse};
pub use persistence::SessionFiles;
