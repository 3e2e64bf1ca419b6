//! Domain traits - Abstractions for infrastructure implementations

pub mod handler;
pub mod transport;

pub use handler::Handler;
pub use transport::{Transport, TransportEvent};
