//! Shared session state
//!
//! Presence, greeted contacts and handlers are read and written both by the
//! transport event pump and by gateway connections. All three live behind a
//! single mutex; every operation takes the lock for one map/set access and
//! never across an `.await`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::traits::Handler;

#[derive(Default)]
struct Inner {
    /// short identity -> online
    presence: HashMap<String, bool>,
    /// short identities that already got the first-contact notice
    greeted: HashSet<String>,
    handlers: HashMap<String, Arc<dyn Handler>>,
}

/// Guarded container for everything a session mutates after startup
#[derive(Default)]
pub struct SessionState {
    inner: Mutex<Inner>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Each critical section is a single insert/lookup, so a panic in
        // another holder cannot leave the data half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_presence(&self, key: &str, online: bool) {
        self.lock().presence.insert(key.to_string(), online);
    }

    pub fn presence(&self, key: &str) -> Option<bool> {
        self.lock().presence.get(key).copied()
    }

    pub fn online_count(&self) -> usize {
        self.lock().presence.values().filter(|online| **online).count()
    }

    /// Record `key` as greeted. Returns `true` if it was not greeted before.
    pub fn mark_greeted(&self, key: &str) -> bool {
        self.lock().greeted.insert(key.to_string())
    }

    /// Insert a handler, returning the one it replaced
    pub fn insert_handler(&self, key: &str, handler: Arc<dyn Handler>) -> Option<Arc<dyn Handler>> {
        self.lock().handlers.insert(key.to_string(), handler)
    }

    pub fn handler(&self, key: &str) -> Option<Arc<dyn Handler>> {
        self.lock().handlers.get(key).cloned()
    }

    pub fn handler_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().handlers.keys().cloned().collect();
        keys.sort();
        keys
    }
}
