//! Typed stream events and frame decoding
//!
//! Every frame on the search stream is a JSON object with a `type`
//! discriminator. Frames that cannot be decoded are reported as
//! [`FrameError`] so the caller can drop them without ending the stream.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Citation, FlightResult, HotelResult};

/// Frame types this client understands
const KNOWN_TYPES: &[&str] = &[
    "start",
    "text_chunk",
    "flights",
    "hotels",
    "citations",
    "complete",
    "error",
];

/// One event from the search stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Start {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Cumulative snapshot of the answer so far, not a delta
    TextChunk { content: String },

    Flights { content: FlightResult },

    Hotels { content: HotelResult },

    Citations { content: Vec<Citation> },

    Complete,

    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl StreamEvent {
    /// Complete and Error end the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete | StreamEvent::Error { .. })
    }

    /// Wire name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::Start { .. } => "start",
            StreamEvent::TextChunk { .. } => "text_chunk",
            StreamEvent::Flights { .. } => "flights",
            StreamEvent::Hotels { .. } => "hotels",
            StreamEvent::Citations { .. } => "citations",
            StreamEvent::Complete => "complete",
            StreamEvent::Error { .. } => "error",
        }
    }
}

/// Why a single frame was rejected
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    NotJson(serde_json::Error),

    #[error("frame has no type discriminator")]
    MissingType,

    #[error("unknown frame type '{0}'")]
    UnknownType(String),

    #[error("malformed '{kind}' frame: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode one frame payload into a typed event
pub fn parse_frame(data: &str) -> Result<StreamEvent, FrameError> {
    let value: serde_json::Value = serde_json::from_str(data).map_err(FrameError::NotJson)?;

    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(FrameError::MissingType)?
        .to_string();

    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return Err(FrameError::UnknownType(kind));
    }

    serde_json::from_value(value).map_err(|source| FrameError::Malformed { kind, source })
}
