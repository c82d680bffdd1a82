//! Events and outcomes published by the orchestrator

use uuid::Uuid;

use super::state::QueryPhase;
use crate::domain::Message;
use crate::search::ErrorKind;

/// Which source produced the committed messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultPath {
    Streamed,
    Fallback,
    Apology,
}

/// What a finished query committed to the conversation
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub query_id: Uuid,
    pub path: ResultPath,
    pub messages: Vec<Message>,
}

/// Progress notifications for front-ends
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    /// The pending user message is visible
    Submitted { query_id: Uuid, prompt: String },

    PhaseChanged { phase: QueryPhase },

    /// Latest cumulative answer text from the stream
    TextUpdated { query_id: Uuid, text: String },

    /// The stream failed and the blocking call took over
    FallbackEngaged { query_id: Uuid, reason: ErrorKind },

    Finalized { query_id: Uuid, path: ResultPath },
}
