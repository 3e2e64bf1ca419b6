//! Domain layer - Core business logic with no external dependencies
//! 
//! This layer contains:
//! - Entities: Core business objects (Identity, messages, presence)
//! - Traits: Abstractions for infrastructure (Transport, Handler)

pub mod entities;
pub mod traits;
