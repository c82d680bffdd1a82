//! Blocking request/response search

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::accumulator::AccumulatedResult;
use super::error::SearchError;
use crate::domain::{Citation, FlightResult, HotelResult, Query};

/// Text committed when the backend answers with nothing
pub const EMPTY_RESPONSE_TEXT: &str =
    "I'm sorry, I couldn't generate a response at this time. Please try again or rephrase your question.";

/// Response body of the blocking endpoint
#[derive(Debug, Default, Deserialize)]
struct FallbackResponse {
    #[serde(default)]
    contents: Vec<FallbackContent>,
}

/// One answer entry. Structured payloads are decoded field by field.
#[derive(Debug, Default, Deserialize)]
struct FallbackContent {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    citations: Option<Value>,
    #[serde(default)]
    flights: Option<Value>,
    #[serde(default)]
    hotels: Option<Value>,
}

/// Decode one optional payload, dropping it with a warning when malformed
fn decode_payload<T: DeserializeOwned>(field: &'static str, value: Option<Value>) -> Option<T> {
    let value = value.filter(|v| !v.is_null())?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(%field, error = %e, "decode_payload: dropping malformed payload");
            None
        }
    }
}

/// Issues the single non-streaming search call
pub struct FallbackInvoker {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl FallbackInvoker {
    pub fn new(http: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        let endpoint = endpoint.into();
        debug!(%endpoint, "FallbackInvoker::new: called");
        Self { http, endpoint, api_key }
    }

    /// POST the query and convert the answer. Never retried.
    pub async fn invoke(&self, query: &Query) -> Result<AccumulatedResult, SearchError> {
        debug!(query_id = %query.id(), endpoint = %self.endpoint, "invoke: called");

        let mut request = self
            .http
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(query);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                debug!(error = %e, "invoke: request timed out");
            }
            SearchError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "invoke: backend rejected request");
            return Err(SearchError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        match interpret_body(&body) {
            Err(SearchError::EmptyResult) => {
                warn!(query_id = %query.id(), "invoke: empty result, using placeholder text");
                Ok(AccumulatedResult::text_only(EMPTY_RESPONSE_TEXT))
            }
            other => other,
        }
    }
}

/// Convert a blocking response body into a result
///
/// Returns [`SearchError::EmptyResult`] when the body carries no answer, and
/// [`SearchError::Protocol`] when it is not the expected JSON shape.
pub fn interpret_body(body: &str) -> Result<AccumulatedResult, SearchError> {
    debug!(body_len = body.len(), "interpret_body: called");
    if body.trim().is_empty() {
        return Err(SearchError::EmptyResult);
    }

    let response: FallbackResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Protocol(format!("invalid search response: {}", e)))?;

    let Some(first) = response.contents.into_iter().next() else {
        return Err(SearchError::EmptyResult);
    };

    let result = AccumulatedResult {
        text: first.content.unwrap_or_default(),
        flights: decode_payload::<FlightResult>("flights", first.flights),
        hotels: decode_payload::<HotelResult>("hotels", first.hotels),
        citations: decode_payload::<Vec<Citation>>("citations", first.citations).unwrap_or_default(),
    };
    if result.text.trim().is_empty() && result.flights.is_none() && result.hotels.is_none() {
        return Err(SearchError::EmptyResult);
    }
    Ok(result)
}
