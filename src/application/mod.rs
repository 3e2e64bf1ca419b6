//! Application layer - Session logic
//! 
//! This layer contains:
//! - State: The guarded container shared by the event pump and the gateway
//! - Services: Presence tracking and the handler registry
//! - Messaging: Message classification and routing
//! - Session: Lifecycle of the one chat session
//! - Errors: Error taxonomy

pub mod errors;
pub mod messaging;
pub mod services;
pub mod session;
pub mod state;

pub use session::{SessionManager, SessionOptions};
