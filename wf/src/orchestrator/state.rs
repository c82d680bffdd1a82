//! Query lifecycle state

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Message, Query};
use crate::search::AccumulatedResult;

/// Where a session is in the life of its current query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryPhase {
    Idle,
    Submitting,
    Streaming,
    FallbackOnly,
    Finalizing,
}

impl QueryPhase {
    /// A query is in flight in every phase but Idle
    pub fn is_busy(self) -> bool {
        self != QueryPhase::Idle
    }
}

impl fmt::Display for QueryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryPhase::Idle => "idle",
            QueryPhase::Submitting => "submitting",
            QueryPhase::Streaming => "streaming",
            QueryPhase::FallbackOnly => "fallback-only",
            QueryPhase::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

/// One-way switch guarding finalization of a query
#[derive(Debug, Default)]
pub struct CompletionLatch(AtomicBool);

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True for exactly one caller
    pub fn try_finalize(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_finalized(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The user's message, shown before it is persisted
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMessage {
    pub query_id: Uuid,
    pub message: Message,
}

/// Everything one in-flight query owns
#[derive(Debug)]
pub struct QueryContext {
    pub query: Query,
    pub accumulator: AccumulatedResult,
    pub cancel: CancellationToken,
    pub latch: Arc<CompletionLatch>,
}

impl QueryContext {
    pub fn new(query: Query) -> Self {
        debug!(query_id = %query.id(), "QueryContext::new: called");
        Self {
            query,
            accumulator: AccumulatedResult::default(),
            cancel: CancellationToken::new(),
            latch: Arc::new(CompletionLatch::new()),
        }
    }

    pub fn query_id(&self) -> Uuid {
        self.query.id()
    }
}
