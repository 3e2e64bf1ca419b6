//! Message classifier - Decides which path a message body takes

/// Body that ends the session
pub const EXIT_KEYWORD: &str = "exit";

/// Prefix that turns a body into a handler command
pub const COMMAND_PREFIX: &str = "jbrake::";

/// Where a normal message is routed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Logout,
    Command(String),
    Generic(String),
}

/// Classifies message bodies. First match wins: exact exit keyword, then
/// command prefix, then everything else.
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    pub fn classify(&self, body: &str) -> Route {
        if body == EXIT_KEYWORD {
            return Route::Logout;
        }

        // Only leading whitespace is trimmed; the rest goes to the handler as-is
        if let Some(command) = body.strip_prefix(&self.command_prefix) {
            return Route::Command(command.trim_start().to_string());
        }

        Route::Generic(body.to_string())
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new(COMMAND_PREFIX)
    }
}
