use super::Identity;

/// Kind of an inbound message as far as routing is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Normal,
    Error,
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Normal => "normal",
            MessageKind::Error => "error",
        }
    }
}

/// A message delivered by the transport. Produced per event, never retained.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub from: Identity,
    pub body: String,
    pub kind: MessageKind,
}

impl InboundMessage {
    pub fn new(from: impl Into<Identity>, body: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            body: body.into(),
            kind: MessageKind::Normal,
        }
    }

    pub fn error(from: impl Into<Identity>, body: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            ..Self::new(from, body)
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}

/// Outbound chat-type message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub to: Identity,
    pub body: String,
}

impl ChatMessage {
    pub fn new(to: Identity, body: impl Into<String>) -> Self {
        Self {
            to,
            body: body.into(),
        }
    }
}
