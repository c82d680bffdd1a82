//! Wayfinder - Streaming travel-search query orchestration
//!
//! Wayfinder drives chat-based flight and hotel search. Each question is
//! answered over an incremental event stream guarded by a watchdog; when the
//! stream fails for any reason the same question is asked once more as a
//! blocking request. Either way the conversation receives exactly one
//! ordered set of answer messages.
//!
//! # Modules
//!
//! - [`domain`] - Messages, queries, sessions and travel payloads
//! - [`search`] - Stream client, blocking fallback, result reducer, watchdog
//! - [`orchestrator`] - Per-session query state machine
//! - [`store`] - Conversation store actor
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`repl`] - Interactive chat

pub mod cli;
pub mod config;
pub mod domain;
pub mod orchestrator;
pub mod repl;
pub mod search;
pub mod store;

// Re-export commonly used types
pub use config::{Config, SearchConfig, StorageConfig, StreamingConfig};
pub use domain::{ChatSession, ContentItem, Message, Query, SessionContext};
pub use orchestrator::{OrchestratorConfig, QueryEvent, QueryOrchestrator, QueryOutcome, ResultPath, SubmitError};
pub use search::{AccumulatedResult, HttpSearchClient, SearchClient, SearchError, StreamEvent};
pub use store::{ConversationStore, StoreError};
