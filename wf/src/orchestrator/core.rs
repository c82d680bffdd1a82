//! The query orchestrator
//!
//! One orchestrator serves one chat session. A submission moves through
//! `Idle -> Submitting -> (Streaming | FallbackOnly) -> Finalizing -> Idle`,
//! and commits exactly one set of result messages: streamed, fallback, or
//! apology.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::config::OrchestratorConfig;
use super::error::SubmitError;
use super::events::{QueryEvent, QueryOutcome, ResultPath};
use super::messages::{apology_message, build_messages};
use super::state::{PendingMessage, QueryContext, QueryPhase};
use crate::domain::{Message, Query, QueryError, SessionContext};
use crate::search::{AccumulatedResult, SearchClient, SearchError, StreamEvent, StreamSignal, Watchdog};
use crate::store::{ConversationStore, StoreResponse};

/// Capacity of the progress event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
struct SessionState {
    phase: QueryPhase,
    pending: Option<PendingMessage>,
}

/// Drives queries for one session against a search client
pub struct QueryOrchestrator {
    session: SessionContext,
    client: Arc<dyn SearchClient>,
    store: ConversationStore,
    watchdog: Duration,
    streaming: AtomicBool,
    state: Mutex<SessionState>,
    events: broadcast::Sender<QueryEvent>,
}

/// Marks the session busy for the lifetime of one submission
struct InFlight<'a> {
    orchestrator: &'a QueryOrchestrator,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.orchestrator.lock_state().pending = None;
        self.orchestrator.set_phase(QueryPhase::Idle);
    }
}

impl QueryOrchestrator {
    pub fn new(
        session: SessionContext,
        client: Arc<dyn SearchClient>,
        store: ConversationStore,
        config: OrchestratorConfig,
    ) -> Self {
        debug!(session_id = %session.session_id, ?config, "QueryOrchestrator::new: called");
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session,
            client,
            store,
            watchdog: config.watchdog,
            streaming: AtomicBool::new(config.streaming_enabled),
            state: Mutex::new(SessionState {
                phase: QueryPhase::Idle,
                pending: None,
            }),
            events,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<QueryEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> QueryPhase {
        self.lock_state().phase
    }

    /// The user message of the in-flight query, if any
    pub fn pending(&self) -> Option<PendingMessage> {
        self.lock_state().pending.clone()
    }

    pub fn is_streaming_enabled(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    /// Toggle streaming. Takes effect from the next submission.
    pub fn set_streaming(&self, enabled: bool) {
        debug!(enabled, "set_streaming: called");
        self.streaming.store(enabled, Ordering::SeqCst);
    }

    /// Persisted messages followed by the pending user message, if it has
    /// not been persisted yet
    pub async fn conversation_view(&self) -> StoreResponse<Vec<Message>> {
        debug!(session_id = %self.session.session_id, "conversation_view: called");
        let mut messages = self.store.messages(&self.session.session_id).await?;
        if let Some(pending) = self.pending()
            && !messages.contains(&pending.message)
        {
            messages.push(pending.message);
        }
        Ok(messages)
    }

    /// Run one query to completion and commit its messages
    ///
    /// Fails only when the input is rejected, another query is in flight, or
    /// the final commit cannot be stored. Search failures end in fallback or
    /// apology text instead.
    pub async fn submit(&self, input: &str) -> Result<QueryOutcome, SubmitError> {
        debug!(session_id = %self.session.session_id, input_len = input.len(), "submit: called");
        if input.trim().is_empty() {
            debug!("submit: empty input");
            return Err(QueryError::EmptyPrompt.into());
        }

        let _in_flight = self.claim()?;
        let session_id = self.session.session_id.as_str();

        let history = match self.store.messages(session_id).await {
            Ok(history) => history,
            Err(e) => {
                warn!(%session_id, error = %e, "submit: history unavailable, sending none");
                Vec::new()
            }
        };
        let query = Query::new(input, &history)?;
        let query_id = query.id();
        info!(%session_id, %query_id, "Query submitted");

        let user_message = Message::user(query.prompt());
        self.lock_state().pending = Some(PendingMessage {
            query_id,
            message: user_message.clone(),
        });
        self.emit(QueryEvent::Submitted {
            query_id,
            prompt: query.prompt().to_string(),
        });

        if let Err(e) = self.store.append_detached(session_id, vec![user_message]).await {
            warn!(%session_id, %query_id, error = %e, "submit: failed to queue user message");
        }

        let mut ctx = QueryContext::new(query);
        let (path, result) = if self.is_streaming_enabled() {
            self.set_phase(QueryPhase::Streaming);
            match self.run_stream(&mut ctx).await {
                Ok(()) => (ResultPath::Streamed, Ok(std::mem::take(&mut ctx.accumulator))),
                Err(e) => {
                    warn!(%query_id, error = %e, "submit: stream failed, using blocking search");
                    self.emit(QueryEvent::FallbackEngaged {
                        query_id,
                        reason: e.kind(),
                    });
                    self.set_phase(QueryPhase::FallbackOnly);
                    (ResultPath::Fallback, self.client.search(&ctx.query).await)
                }
            }
        } else {
            self.set_phase(QueryPhase::FallbackOnly);
            (ResultPath::Fallback, self.client.search(&ctx.query).await)
        };

        let (path, messages) = match result {
            Ok(result) => (path, build_messages(result)),
            Err(e) => {
                warn!(%query_id, error = %e, "submit: blocking search failed");
                (ResultPath::Apology, vec![apology_message()])
            }
        };

        self.finalize(&ctx, path, messages).await
    }

    /// Consume the stream until it completes, fails, or the watchdog fires
    async fn run_stream(&self, ctx: &mut QueryContext) -> Result<(), SearchError> {
        let query_id = ctx.query_id();
        debug!(%query_id, watchdog_ms = self.watchdog.as_millis() as u64, "run_stream: called");

        let cancel = ctx.cancel.clone();
        let latch = ctx.latch.clone();
        let watchdog = Watchdog::start(self.watchdog, move || {
            if latch.is_finalized() {
                return;
            }
            warn!(%query_id, "Stream watchdog expired");
            cancel.cancel();
        });

        // the deadline covers connecting too
        let opened = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(SearchError::Timeout(self.watchdog)),
            opened = self.client.open_stream(&ctx.query, ctx.cancel.clone()) => opened,
        };
        let mut handle = match opened {
            Ok(handle) => handle,
            Err(e) => {
                watchdog.clear();
                return Err(e);
            }
        };

        let outcome = loop {
            let signal = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => break Err(SearchError::Timeout(self.watchdog)),
                signal = handle.next() => signal,
            };

            match signal {
                Some(StreamSignal::Event(event)) => {
                    ctx.accumulator = std::mem::take(&mut ctx.accumulator).apply(&event);
                    if let StreamEvent::TextChunk { .. } = event {
                        self.emit(QueryEvent::TextUpdated {
                            query_id,
                            text: ctx.accumulator.text.clone(),
                        });
                    }
                }
                Some(StreamSignal::Completed) => break Ok(()),
                Some(StreamSignal::Failed(e)) => break Err(e),
                None if ctx.cancel.is_cancelled() => break Err(SearchError::Timeout(self.watchdog)),
                None => break Err(SearchError::Transport("stream closed without completing".to_string())),
            }
        };

        watchdog.clear();
        if outcome.is_err() {
            handle.cancel();
            ctx.accumulator = AccumulatedResult::default();
        }
        debug!(%query_id, ok = outcome.is_ok(), "run_stream: done");
        outcome
    }

    /// Commit the messages of a query in one store update
    async fn finalize(
        &self,
        ctx: &QueryContext,
        path: ResultPath,
        messages: Vec<Message>,
    ) -> Result<QueryOutcome, SubmitError> {
        let query_id = ctx.query_id();
        debug!(%query_id, ?path, count = messages.len(), "finalize: called");

        let first = ctx.latch.try_finalize();
        debug_assert!(first, "query finalized twice");

        self.set_phase(QueryPhase::Finalizing);
        self.lock_state().pending = None;
        self.store.append(&self.session.session_id, messages.clone()).await?;

        info!(session_id = %self.session.session_id, %query_id, ?path, "Query finalized");
        self.emit(QueryEvent::Finalized { query_id, path });
        Ok(QueryOutcome {
            query_id,
            path,
            messages,
        })
    }

    /// Move Idle -> Submitting, or report the session busy
    fn claim(&self) -> Result<InFlight<'_>, SubmitError> {
        {
            let mut state = self.lock_state();
            if state.phase.is_busy() {
                debug!(phase = %state.phase, "claim: query already in flight");
                return Err(SubmitError::Busy(self.session.session_id.clone()));
            }
            state.phase = QueryPhase::Submitting;
        }
        self.emit(QueryEvent::PhaseChanged {
            phase: QueryPhase::Submitting,
        });
        Ok(InFlight { orchestrator: self })
    }

    fn set_phase(&self, phase: QueryPhase) {
        let changed = {
            let mut state = self.lock_state();
            let changed = state.phase != phase;
            state.phase = phase;
            changed
        };
        if changed {
            debug!(%phase, "set_phase: transition");
            self.emit(QueryEvent::PhaseChanged { phase });
        }
    }

    fn emit(&self, event: QueryEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
