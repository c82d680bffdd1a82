//! Turning a result into conversation messages

use tracing::debug;

use crate::domain::{ContentItem, Message};
use crate::search::{AccumulatedResult, EMPTY_RESPONSE_TEXT};

/// Committed when no answer could be obtained at all
pub const APOLOGY_TEXT: &str = "Sorry, I couldn't process your request at this time.";

/// Assistant messages for a result, in display order: text, flights, hotels
///
/// Citations ride on the text item. Empty parts produce no message; a result
/// with nothing at all produces the placeholder text.
pub fn build_messages(result: AccumulatedResult) -> Vec<Message> {
    debug!(
        has_text = result.has_text(),
        has_flights = result.has_flights(),
        has_hotels = result.has_hotels(),
        "build_messages: called"
    );
    if result.is_empty() {
        return vec![Message::assistant(EMPTY_RESPONSE_TEXT)];
    }

    let has_text = result.has_text();
    let has_flights = result.has_flights();
    let has_hotels = result.has_hotels();
    let mut messages = Vec::with_capacity(3);

    if has_text {
        messages.push(Message::assistant_item(ContentItem::Text {
            content: result.text,
            citations: result.citations,
        }));
    }
    if has_flights && let Some(flights) = result.flights {
        messages.push(Message::assistant_item(ContentItem::Flight { content: flights }));
    }
    if has_hotels && let Some(hotels) = result.hotels {
        messages.push(Message::assistant_item(ContentItem::Hotel { content: hotels }));
    }
    messages
}

/// The single message committed when every path failed
pub fn apology_message() -> Message {
    Message::assistant(APOLOGY_TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Citation, FlightOption, FlightResult, HotelProperty, HotelResult};

    fn full_result() -> AccumulatedResult {
        AccumulatedResult {
            text: "Options for Rome".to_string(),
            flights: Some(FlightResult {
                other_flights: vec![FlightOption::default()],
                ..Default::default()
            }),
            hotels: Some(HotelResult {
                properties: vec![HotelProperty {
                    name: "Hotel Artemide".to_string(),
                    ..Default::default()
                }],
                search_metadata: None,
            }),
            citations: vec![Citation::url("https://rome.example")],
        }
    }

    #[test]
    fn test_order_is_text_flight_hotel() {
        let messages = build_messages(full_result());
        let kinds: Vec<&str> = messages.iter().map(|m| m.contents[0].kind()).collect();
        assert_eq!(kinds, vec!["text", "flight", "hotel"]);
        assert!(messages.iter().all(|m| !m.is_user));

        match &messages[0].contents[0] {
            ContentItem::Text { citations, .. } => assert_eq!(citations.len(), 1),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_parts_are_skipped() {
        let mut result = full_result();
        result.text = String::new();
        result.hotels = Some(HotelResult::default());

        let messages = build_messages(result);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].contents[0].kind(), "flight");
    }

    #[test]
    fn test_nothing_becomes_placeholder() {
        let messages = build_messages(AccumulatedResult::default());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text(), EMPTY_RESPONSE_TEXT);
    }

    #[test]
    fn test_apology() {
        assert_eq!(apology_message().text(), APOLOGY_TEXT);
    }
}
