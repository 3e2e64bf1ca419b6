//! Domain entities - Core business objects with no external dependencies

pub mod credentials;
pub mod identity;
pub mod message;
pub mod presence;

pub use credentials::Credentials;
pub use identity::Identity;
pub use message::{ChatMessage, InboundMessage, MessageKind};
pub use presence::{Availability, Decision, PresenceStatus};
