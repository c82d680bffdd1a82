//! Query orchestration
//!
//! The QueryOrchestrator runs each submission through the stream with a
//! watchdog, falls back to one blocking call on any stream failure, and
//! commits exactly one ordered set of result messages per query.

mod config;
mod core;
mod error;
mod events;
mod messages;
mod state;

pub use config::OrchestratorConfig;
pub use core::QueryOrchestrator;
pub use error::SubmitError;
pub use events::{QueryEvent, QueryOutcome, ResultPath};
pub use messages::{APOLOGY_TEXT, apology_message, build_messages};
pub use state::{CompletionLatch, PendingMessage, QueryContext, QueryPhase};
