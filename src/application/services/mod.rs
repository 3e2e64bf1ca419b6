//! Application services - Presence and handler bookkeeping

pub mod handler_registry;
pub mod presence_tracker;

pub use handler_registry::{missing_handler_message, EchoHandler, HandlerRegistry};
pub use presence_tracker::PresenceTracker;
