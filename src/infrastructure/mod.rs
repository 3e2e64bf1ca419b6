//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Adapters: Transport implementations (console for development)
//! - Gateway: Remote invocation over a Unix socket

pub mod adapters;
pub mod config;
pub mod gateway;
