// src/backend/services/access_cache.rs
// Session-scoped "already unlocked" cache for password-protected reports.
//
// Purely a UX convenience: it suppresses a redundant password prompt within
// one browser session and grants no authorization on its own. It lives on the
// heap only, so an upgrade wipes it, matching the session-scoped lifetime.

use crate::models::common::{ReportId, SessionId};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

/// Per-session record of which protected reports were unlocked.
#[derive(Debug, Default, Clone)]
pub struct PasswordAccessCache {
    unlocked: BTreeSet<ReportId>,
}

impl PasswordAccessCache {
    pub fn store(&mut self, report_id: &str) {
        self.unlocked.insert(report_id.to_string());
    }

    pub fn has_access(&self, report_id: &str) -> bool {
        self.unlocked.contains(report_id)
    }

    pub fn clear(&mut self, report_id: &str) {
        self.unlocked.remove(report_id);
    }

    pub fn clear_all(&mut self) {
        self.unlocked.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty()
    }
}

/// All sessions' caches, keyed by the opaque session id. Injectable so tests
/// can run against their own registry and assert session isolation.
#[derive(Debug, Default)]
pub struct AccessCacheRegistry {
    sessions: HashMap<SessionId, PasswordAccessCache>,
}

impl AccessCacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, session: &SessionId, report_id: &str) {
        self.sessions.entry(session.clone()).or_default().store(report_id);
    }

    pub fn has_access(&self, session: &SessionId, report_id: &str) -> bool {
        self.sessions
            .get(session)
            .is_some_and(|cache| cache.has_access(report_id))
    }

    pub fn clear(&mut self, session: &SessionId, report_id: &str) {
        if let Some(cache) = self.sessions.get_mut(session) {
            cache.clear(report_id);
            if cache.is_empty() {
                self.sessions.remove(session);
            }
        }
    }

    pub fn clear_all(&mut self, session: &SessionId) {
        self.sessions.remove(session);
    }
}

thread_local! {
    // In-memory registry backing the canister endpoints. Cleared on upgrade.
    static REGISTRY: RefCell<AccessCacheRegistry> = RefCell::new(AccessCacheRegistry::new());
}

pub fn store(session: &SessionId, report_id: &str) {
    REGISTRY.with(|registry| registry.borrow_mut().store(session, report_id));
}

pub fn has_access(session: &SessionId, report_id: &str) -> bool {
    REGISTRY.with(|registry| registry.borrow().has_access(session, report_id))
}

pub fn clear(session: &SessionId, report_id: &str) {
    REGISTRY.with(|registry| registry.borrow_mut().clear(session, report_id));
}

pub fn clear_all(session: &SessionId) {
    REGISTRY.with(|registry| registry.borrow_mut().clear_all(session));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlocks_are_isolated_between_sessions() {
        let mut registry = AccessCacheRegistry::new();
        let alice = "session-alice".to_string();
        let bob = "session-bob".to_string();

        registry.store(&alice, "report-1");
        assert!(registry.has_access(&alice, "report-1"));
        assert!(!registry.has_access(&bob, "report-1"));
        assert!(!registry.has_access(&alice, "report-2"));
    }

    #[test]
    fn clear_revokes_a_single_report() {
        let mut registry = AccessCacheRegistry::new();
        let session = "session-1".to_string();
        registry.store(&session, "a");
        registry.store(&session, "b");

        registry.clear(&session, "a");
        assert!(!registry.has_access(&session, "a"));
        assert!(registry.has_access(&session, "b"));
    }

    #[test]
    fn clear_all_wipes_the_session() {
        let mut registry = AccessCacheRegistry::new();
        let session = "session-1".to_string();
        registry.store(&session, "a");
        registry.store(&session, "b");

        registry.clear_all(&session);
        assert!(!registry.has_access(&session, "a"));
        assert!(!registry.has_access(&session, "b"));
    }
}
