//! Domain types for conversations and travel search results

mod message;
mod query;
mod session;
mod travel;

pub use message::{Citation, ContentItem, Message};
pub use query::{Query, QueryError, text_only_history};
pub use session::{ChatSession, DEFAULT_TITLE, SessionContext, generate_chat_title};
pub use travel::{
    Airport, FlightLeg, FlightOption, FlightResult, FlightSearchMetadata, HotelProperty, HotelResult,
    HotelSearchMetadata, Layover, Rate,
};
