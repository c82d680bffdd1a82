//! Streaming search over server-sent events
//!
//! [`EventStreamClient::open`] starts one connection per query and spawns a
//! pump task that decodes frames and forwards them to a [`StreamHandle`].
//! The pump emits at most one terminal signal (completed or failed), and
//! emits nothing at all once the query's cancellation token has fired.

use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::SearchError;
use super::event::{StreamEvent, parse_frame};
use crate::domain::Query;

/// Buffered signals between the pump task and the consumer
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// What the consumer of a stream observes
#[derive(Debug)]
pub enum StreamSignal {
    /// A non-terminal event to fold into the result
    Event(StreamEvent),
    /// The backend finished the answer
    Completed,
    /// The stream failed and will produce nothing further
    Failed(SearchError),
}

impl StreamSignal {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamSignal::Completed | StreamSignal::Failed(_))
    }
}

/// Consumer side of one open stream
pub struct StreamHandle {
    query_id: Uuid,
    rx: mpsc::Receiver<StreamSignal>,
    cancel: CancellationToken,
    terminated: bool,
}

impl StreamHandle {
    /// Wrap a signal channel. Cancelling `cancel` must stop the producer.
    pub fn new(query_id: Uuid, rx: mpsc::Receiver<StreamSignal>, cancel: CancellationToken) -> Self {
        debug!(%query_id, "StreamHandle::new: called");
        Self {
            query_id,
            rx,
            cancel,
            terminated: false,
        }
    }

    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    /// Next signal, or None once a terminal signal was seen, the stream was
    /// cancelled, or the producer went away
    pub async fn next(&mut self) -> Option<StreamSignal> {
        if self.terminated || self.cancel.is_cancelled() {
            return None;
        }

        let signal = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            signal = self.rx.recv() => signal,
        };

        match &signal {
            Some(s) if !s.is_terminal() => {}
            _ => self.terminated = true,
        }
        signal
    }

    /// Close the connection. No-op after a terminal signal.
    pub fn cancel(&mut self) {
        if self.terminated {
            debug!(query_id = %self.query_id, "StreamHandle::cancel: already terminated");
            return;
        }
        debug!(query_id = %self.query_id, "StreamHandle::cancel: cancelling");
        self.terminated = true;
        self.cancel.cancel();
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if !self.terminated {
            self.cancel.cancel();
        }
    }
}

/// Opens streaming connections against the search endpoint
pub struct EventStreamClient {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl EventStreamClient {
    pub fn new(http: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        let endpoint = endpoint.into();
        debug!(%endpoint, "EventStreamClient::new: called");
        Self { http, endpoint, api_key }
    }

    /// Open a stream for `query`. Must be called within a Tokio runtime.
    ///
    /// The connection lives until a terminal frame, a transport failure, or
    /// `cancel` firing, whichever comes first.
    pub fn open(&self, query: &Query, cancel: CancellationToken) -> Result<StreamHandle, SearchError> {
        debug!(query_id = %query.id(), endpoint = %self.endpoint, "EventStreamClient::open: called");
        let history = query.history_json()?;

        let mut request = self
            .http
            .get(&self.endpoint)
            .query(&[("prompt", query.prompt()), ("history", history.as_str())])
            .header("accept", "text/event-stream");
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let source = EventSource::new(request).map_err(|e| SearchError::Transport(e.to_string()))?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(pump(source, tx, cancel.clone(), query.id()));

        Ok(StreamHandle::new(query.id(), rx, cancel))
    }
}

/// Forward decoded frames until a terminal condition
async fn pump(mut source: EventSource, tx: mpsc::Sender<StreamSignal>, cancel: CancellationToken, query_id: Uuid) {
    debug!(%query_id, "pump: started");
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%query_id, "pump: cancelled, closing connection");
                source.close();
                return;
            }
            next = source.next() => next,
        };

        let signal = match next {
            None => StreamSignal::Failed(SearchError::Transport("stream closed before completion".to_string())),
            Some(Ok(Event::Open)) => {
                debug!(%query_id, "pump: connection open");
                continue;
            }
            Some(Ok(Event::Message(message))) => match parse_frame(&message.data) {
                Ok(StreamEvent::Complete) => {
                    debug!(%query_id, "pump: complete");
                    StreamSignal::Completed
                }
                Ok(StreamEvent::Error { message }) => {
                    debug!(%query_id, ?message, "pump: backend error frame");
                    StreamSignal::Failed(SearchError::Stream(
                        message.unwrap_or_else(|| "unknown stream error".to_string()),
                    ))
                }
                Ok(event) => {
                    debug!(%query_id, event_type = event.event_type(), "pump: event");
                    StreamSignal::Event(event)
                }
                Err(e) => {
                    warn!(%query_id, error = %e, "pump: dropping frame");
                    continue;
                }
            },
            Some(Err(e)) => {
                debug!(%query_id, error = %e, "pump: event source error");
                StreamSignal::Failed(classify_source_error(e))
            }
        };

        let terminal = signal.is_terminal();
        let delivered = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            sent = tx.send(signal) => sent.is_ok(),
        };

        if !delivered || terminal {
            debug!(%query_id, delivered, terminal, "pump: closing connection");
            source.close();
            return;
        }
    }
}

/// Map event-source failures onto the search error taxonomy
fn classify_source_error(error: reqwest_eventsource::Error) -> SearchError {
    use reqwest_eventsource::Error;

    match error {
        Error::Transport(e) => SearchError::Network(e),
        Error::StreamEnded => SearchError::Transport("stream ended before completion".to_string()),
        Error::InvalidStatusCode(status, _) => {
            SearchError::Transport(format!("stream endpoint returned {}", status))
        }
        Error::InvalidContentType(content_type, _) => {
            SearchError::Protocol(format!("unexpected content type {:?}", content_type))
        }
        other => SearchError::Protocol(other.to_string()),
    }
}
