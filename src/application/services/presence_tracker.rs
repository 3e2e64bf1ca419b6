use std::sync::Arc;
use tracing::{debug, info};

use crate::application::state::SessionState;
use crate::domain::entities::{Availability, Decision, Identity, PresenceStatus};

/// Tracks contact availability and decides on subscription requests
pub struct PresenceTracker {
    self_domain: String,
    state: Arc<SessionState>,
}

impl PresenceTracker {
    pub fn new(self_domain: impl Into<String>, state: Arc<SessionState>) -> Self {
        Self {
            self_domain: self_domain.into(),
            state,
        }
    }

    /// Accept requests from our own domain, leave everything else pending.
    /// The caller is responsible for confirming an accepted request on the
    /// transport.
    pub fn on_subscription_request(&self, requester: &Identity) -> Decision {
        if requester.domain() == self.self_domain {
            info!("Accepting subscription request from {}", requester);
            Decision::Accept
        } else {
            debug!("Ignoring subscription request from {}", requester);
            Decision::Ignore
        }
    }

    pub fn on_presence_change(&self, who: &Identity, available: bool) {
        let key = who.short();
        self.state.set_presence(&key, available);
        info!(
            "Presence: {} is {} ({} contacts online)",
            key,
            if available { "online" } else { "offline" },
            self.state.online_count()
        );
    }

    /// Wire-level entry point; unspecified availability is ignored.
    pub fn on_presence(&self, who: &Identity, availability: Availability) {
        match availability {
            Availability::Available => self.on_presence_change(who, true),
            Availability::Unavailable => self.on_presence_change(who, false),
            Availability::Unspecified => debug!("Ignoring presence without availability from {}", who),
        }
    }

    pub fn is_online(&self, who: &Identity) -> PresenceStatus {
        self.state.presence(&who.short()).into()
    }

    pub fn online_count(&self) -> usize {
        self.state.online_count()
    }
}
