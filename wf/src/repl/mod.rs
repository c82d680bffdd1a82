//! Interactive chat for Wayfinder
//!
//! Streams answers to the terminal as they arrive and supports slash
//! commands for toggling streaming and reviewing the conversation.

mod display;
mod session;

pub use display::{describe_item, print_message};
pub use session::{ChatRepl, submit_and_print};
