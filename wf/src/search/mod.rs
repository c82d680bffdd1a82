//! Search backend access
//!
//! Provides the streaming client, the blocking fallback, the pure result
//! reducer and the per-query watchdog.

mod accumulator;
pub mod client;
mod error;
mod event;
mod fallback;
mod stream;
mod watchdog;

pub use accumulator::{AccumulatedResult, apply};
pub use client::{HttpSearchClient, SearchClient};
pub use error::{ErrorKind, SearchError};
pub use event::{FrameError, StreamEvent, parse_frame};
pub use fallback::{EMPTY_RESPONSE_TEXT, FallbackInvoker, interpret_body};
pub use stream::{EventStreamClient, StreamHandle, StreamSignal};
pub use watchdog::{WATCHDOG_TIMEOUT, Watchdog};
