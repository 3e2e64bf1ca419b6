//! Message handling - Classification and routing of inbound messages

pub mod parser;
pub mod router;

pub use parser::{MessageParser, Route};
pub use router::{MessageRouter, Outcome};
