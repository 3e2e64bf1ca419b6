//! parley-bot - a single chat session that tracks presence, greets new
//! contacts and routes commands to pluggable handlers, local or remote.

pub mod application;
pub mod domain;
pub mod infrastructure;
