/// Availability as announced on the wire. `Unspecified` covers every
/// presence type that says nothing about being online (probes, errors...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
    Unspecified,
}

/// What the session knows about a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresenceStatus {
    Online,
    Offline,
    /// No presence event has been seen for this contact
    Unknown,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Offline => "offline",
            PresenceStatus::Unknown => "unknown",
        }
    }
}

impl From<Option<bool>> for PresenceStatus {
    fn from(online: Option<bool>) -> Self {
        match online {
            Some(true) => PresenceStatus::Online,
            Some(false) => PresenceStatus::Offline,
            None => PresenceStatus::Unknown,
        }
    }
}

/// Outcome of a subscription request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    /// Left pending, no explicit deny is sent
    Ignore,
}
