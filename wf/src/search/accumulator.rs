//! Folding stream events into one result
//!
//! The reducer is pure: it never performs I/O and can be applied to the same
//! event any number of times. Each field is last-write-wins, so the final
//! state only depends on the relative order of events of the same type.

use crate::domain::{Citation, FlightResult, HotelResult};

use super::event::StreamEvent;

/// The answer to one query, built from stream events or a blocking response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatedResult {
    pub text: String,
    pub flights: Option<FlightResult>,
    pub hotels: Option<HotelResult>,
    pub citations: Vec<Citation>,
}

impl AccumulatedResult {
    /// Fold one event into this result
    pub fn apply(self, event: &StreamEvent) -> Self {
        apply(self, event)
    }

    /// Fold a whole event sequence, starting from an empty result
    pub fn fold<'a>(events: impl IntoIterator<Item = &'a StreamEvent>) -> Self {
        events.into_iter().fold(Self::default(), apply)
    }

    /// A result carrying only text
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn has_flights(&self) -> bool {
        self.flights.as_ref().is_some_and(|f| !f.is_empty())
    }

    pub fn has_hotels(&self) -> bool {
        self.hotels.as_ref().is_some_and(|h| !h.is_empty())
    }

    /// Nothing worth showing the user
    pub fn is_empty(&self) -> bool {
        !self.has_text() && !self.has_flights() && !self.has_hotels()
    }
}

/// Reducer: `state' = apply(state, event)`
///
/// Text chunks are cumulative snapshots and replace the text outright.
/// Control events (start, complete, error) leave the state unchanged.
pub fn apply(mut state: AccumulatedResult, event: &StreamEvent) -> AccumulatedResult {
    match event {
        StreamEvent::TextChunk { content } => state.text = content.clone(),
        StreamEvent::Flights { content } => state.flights = Some(content.clone()),
        StreamEvent::Hotels { content } => state.hotels = Some(content.clone()),
        StreamEvent::Citations { content } => state.citations = content.clone(),
        StreamEvent::Start { .. } | StreamEvent::Complete | StreamEvent::Error { .. } => {}
    }
    state
}
