//! Integration tests for Wayfinder
//!
//! These run the orchestrator against a mock search backend over real HTTP,
//! covering the stream path, every fallback trigger and the apology path.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wayfinder::config::SearchConfig;
use wayfinder::domain::{ContentItem, SessionContext};
use wayfinder::orchestrator::{APOLOGY_TEXT, OrchestratorConfig, QueryOrchestrator, ResultPath};
use wayfinder::search::{EMPTY_RESPONSE_TEXT, HttpSearchClient};
use wayfinder::store::ConversationStore;

const SESSION: &str = "integration";

fn sse(frames: &[Value]) -> String {
    frames.iter().map(|f| format!("data: {}\n\n", f)).collect()
}

fn stream_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

fn orchestrator(server: &MockServer, store: &ConversationStore, config: OrchestratorConfig) -> QueryOrchestrator {
    let search = SearchConfig {
        base_url: server.uri(),
        search_path: "/search".to_string(),
        api_key_env: None,
        timeout_ms: 5_000,
    };
    let client = HttpSearchClient::from_config(&search).expect("Failed to create client");
    QueryOrchestrator::new(SessionContext::new(SESSION), Arc::new(client), store.clone(), config)
}

fn streaming(watchdog: Duration) -> OrchestratorConfig {
    OrchestratorConfig {
        streaming_enabled: true,
        watchdog,
    }
}

fn flights_payload() -> Value {
    json!({
        "best_flights": [{
            "flights": [{
                "departure_airport": {"id": "JFK", "name": "John F. Kennedy International Airport"},
                "arrival_airport": {"id": "LIS", "name": "Humberto Delgado Airport"},
                "airline": "TAP Air Portugal",
                "duration": 405
            }],
            "price": 538,
            "type": "Round trip"
        }],
        "other_flights": []
    })
}

fn hotels_payload() -> Value {
    json!({
        "properties": [{
            "name": "Memmo Alfama",
            "rate_per_night": {"lowest": "$212", "extracted_lowest": 212},
            "overall_rating": 4.6
        }]
    })
}

async fn mount_fallback(server: &MockServer, status: u16, body: Value, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(expected)
        .mount(server)
        .await;
}

fn fallback_answer(text: &str) -> Value {
    json!({ "contents": [{ "content": text }] })
}

// =============================================================================
// Stream Path Tests
// =============================================================================

#[tokio::test]
async fn test_streamed_answer_commits_ordered_messages() {
    let server = MockServer::start().await;
    let body = sse(&[
        json!({"type": "start", "message": "Starting search..."}),
        json!({"type": "text_chunk", "content": "Lisbon"}),
        json!({"type": "text_chunk", "content": "Lisbon in May is mild."}),
        json!({"type": "flights", "content": flights_payload()}),
        json!({"type": "hotels", "content": hotels_payload()}),
        json!({"type": "citations", "content": ["https://visitlisboa.example"]}),
        json!({"type": "complete"}),
    ]);

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("prompt", "Trips to Lisbon in May"))
        .and(query_param("history", "[]"))
        .respond_with(stream_response(body))
        .expect(1)
        .mount(&server)
        .await;
    mount_fallback(&server, 200, fallback_answer("unused"), 0).await;

    let store = ConversationStore::in_memory();
    let orchestrator = orchestrator(&server, &store, streaming(Duration::from_secs(10)));

    let outcome = orchestrator.submit("Trips to Lisbon in May").await.expect("submit failed");
    assert_eq!(outcome.path, ResultPath::Streamed);
    assert_eq!(outcome.messages.len(), 3);

    match &outcome.messages[0].contents[0] {
        ContentItem::Text { content, citations } => {
            assert_eq!(content, "Lisbon in May is mild.");
            assert_eq!(citations.len(), 1);
            assert_eq!(citations[0].url, "https://visitlisboa.example");
        }
        other => panic!("expected text first, got {:?}", other),
    }
    assert_eq!(outcome.messages[1].contents[0].kind(), "flight");
    assert_eq!(outcome.messages[2].contents[0].kind(), "hotel");

    let stored = store.messages(SESSION).await.unwrap();
    assert_eq!(stored.len(), 4, "user message plus three answers");
    assert!(stored[0].is_user);
    assert_eq!(stored[0].text(), "Trips to Lisbon in May");
    assert_eq!(&stored[1..], outcome.messages.as_slice());
}

#[tokio::test]
async fn test_history_is_sent_as_text_only() {
    let server = MockServer::start().await;
    let first = sse(&[
        json!({"type": "text_chunk", "content": "Porto is lovely."}),
        json!({"type": "flights", "content": flights_payload()}),
        json!({"type": "complete"}),
    ]);
    let second = sse(&[
        json!({"type": "text_chunk", "content": "Try the Ribeira."}),
        json!({"type": "complete"}),
    ]);

    let expected_history = json!([
        {"isUser": true, "contents": [{"type": "text", "content": "Where to go?"}]},
        {"isUser": false, "contents": [{"type": "text", "content": "Porto is lovely."}]}
    ]);

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("prompt", "Where to go?"))
        .respond_with(stream_response(first))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("prompt", "Where to stay?"))
        .respond_with(stream_response(second))
        .expect(1)
        .mount(&server)
        .await;
    mount_fallback(&server, 200, fallback_answer("unused"), 0).await;

    let store = ConversationStore::in_memory();
    let orchestrator = orchestrator(&server, &store, streaming(Duration::from_secs(10)));

    orchestrator.submit("Where to go?").await.unwrap();
    orchestrator.submit("Where to stay?").await.unwrap();

    let requests = server.received_requests().await.unwrap_or_default();
    let second_request = requests
        .iter()
        .find(|r| r.url.query_pairs().any(|(k, v)| k == "prompt" && v == "Where to stay?"))
        .expect("second stream request");
    let history = second_request
        .url
        .query_pairs()
        .find(|(k, _)| k == "history")
        .map(|(_, v)| v.into_owned())
        .expect("history parameter");
    let history: Value = serde_json::from_str(&history).unwrap();

    let contents: Vec<&Value> = history
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|m| m["contents"].as_array().unwrap())
        .collect();
    assert!(contents.iter().all(|c| c["type"] == "text"), "history must be text only");
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[0]["contents"], expected_history[0]["contents"]);
    assert_eq!(history[1]["contents"], expected_history[1]["contents"]);
}

#[tokio::test]
async fn test_unparseable_frames_are_dropped() {
    let server = MockServer::start().await;
    let body = format!(
        "data: not json at all\n\n{}data: {}\n\n{}",
        sse(&[json!({"type": "mystery", "content": 1})]),
        json!({"type": "text_chunk"}),
        sse(&[
            json!({"type": "text_chunk", "content": "Still here."}),
            json!({"type": "complete"}),
        ])
    );

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(stream_response(body))
        .mount(&server)
        .await;
    mount_fallback(&server, 200, fallback_answer("unused"), 0).await;

    let store = ConversationStore::in_memory();
    let orchestrator = orchestrator(&server, &store, streaming(Duration::from_secs(10)));

    let outcome = orchestrator.submit("Anything").await.unwrap();
    assert_eq!(outcome.path, ResultPath::Streamed);
    assert_eq!(outcome.messages.len(), 1);
    assert_eq!(outcome.messages[0].text(), "Still here.");
}

// =============================================================================
// Fallback Tests
// =============================================================================

#[tokio::test]
async fn test_stream_http_error_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_fallback(&server, 200, fallback_answer("Fallback answer."), 1).await;

    let store = ConversationStore::in_memory();
    let orchestrator = orchestrator(&server, &store, streaming(Duration::from_secs(10)));

    let outcome = orchestrator.submit("Flights to Oslo").await.unwrap();
    assert_eq!(outcome.path, ResultPath::Fallback);
    assert_eq!(outcome.messages.len(), 1);
    assert_eq!(outcome.messages[0].text(), "Fallback answer.");
}

#[tokio::test]
async fn test_error_frame_discards_partial_answer() {
    let server = MockServer::start().await;
    let body = sse(&[
        json!({"type": "text_chunk", "content": "Half an ans"}),
        json!({"type": "flights", "content": flights_payload()}),
        json!({"type": "error", "message": "HTTP error! status: 502"}),
    ]);
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(stream_response(body))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({"prompt": "Cheap flights"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(fallback_answer("Whole answer.")))
        .expect(1)
        .mount(&server)
        .await;

    let store = ConversationStore::in_memory();
    let orchestrator = orchestrator(&server, &store, streaming(Duration::from_secs(10)));

    let outcome = orchestrator.submit("Cheap flights").await.unwrap();
    assert_eq!(outcome.path, ResultPath::Fallback);
    assert_eq!(outcome.messages.len(), 1, "no streamed flights survive");
    assert_eq!(outcome.messages[0].text(), "Whole answer.");

    let stored = store.messages(SESSION).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn test_stream_closed_without_complete_falls_back() {
    let server = MockServer::start().await;
    let body = sse(&[json!({"type": "text_chunk", "content": "Cut off"})]);
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(stream_response(body))
        .mount(&server)
        .await;
    mount_fallback(&server, 200, fallback_answer("Recovered."), 1).await;

    let store = ConversationStore::in_memory();
    let orchestrator = orchestrator(&server, &store, streaming(Duration::from_secs(10)));

    let outcome = orchestrator.submit("Hotels in Rome").await.unwrap();
    assert_eq!(outcome.path, ResultPath::Fallback);
    assert_eq!(outcome.messages[0].text(), "Recovered.");
}

#[tokio::test]
async fn test_watchdog_expiry_falls_back() {
    let server = MockServer::start().await;
    let body = sse(&[
        json!({"type": "text_chunk", "content": "Too late"}),
        json!({"type": "complete"}),
    ]);
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(stream_response(body).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    mount_fallback(&server, 200, fallback_answer("In time."), 1).await;

    let store = ConversationStore::in_memory();
    let orchestrator = orchestrator(&server, &store, streaming(Duration::from_millis(200)));

    let started = std::time::Instant::now();
    let outcome = orchestrator.submit("Weekend in Paris").await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(4), "watchdog should cut the stream short");
    assert_eq!(outcome.path, ResultPath::Fallback);
    assert_eq!(outcome.messages.len(), 1);
    assert_eq!(outcome.messages[0].text(), "In time.");
}

#[tokio::test]
async fn test_streaming_disabled_goes_straight_to_blocking_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_fallback(&server, 200, json!({"contents": []}), 1).await;

    let store = ConversationStore::in_memory();
    let config = OrchestratorConfig {
        streaming_enabled: false,
        watchdog: Duration::from_secs(10),
    };
    let orchestrator = orchestrator(&server, &store, config);

    let outcome = orchestrator.submit("Anything at all").await.unwrap();
    assert_eq!(outcome.path, ResultPath::Fallback);
    assert_eq!(outcome.messages.len(), 1);
    assert_eq!(outcome.messages[0].text(), EMPTY_RESPONSE_TEXT);
}

// =============================================================================
// Apology Tests
// =============================================================================

#[tokio::test]
async fn test_both_paths_failing_commits_apology() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_fallback(&server, 500, json!({"error": "boom"}), 1).await;

    let store = ConversationStore::in_memory();
    let orchestrator = orchestrator(&server, &store, streaming(Duration::from_secs(10)));

    let outcome = orchestrator.submit("Flights to Tokyo").await.unwrap();
    assert_eq!(outcome.path, ResultPath::Apology);
    assert_eq!(outcome.messages.len(), 1);
    assert_eq!(outcome.messages[0].text(), APOLOGY_TEXT);

    let stored = store.messages(SESSION).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].text(), APOLOGY_TEXT);
    assert!(orchestrator.pending().is_none());
    assert!(!orchestrator.phase().is_busy());
}
