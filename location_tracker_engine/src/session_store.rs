use std::sync::{Arc, Mutex};

use chrono::Utc;
use location_tracker_lib::{location_fix::LocationFix, track_session::TrackSession};

use crate::observable::ObservableState;

struct StoreInner {
    sessions: Vec<TrackSession>,
    /// False until a session has been started, and again once the active
    /// (last) session has been deleted. Appends are refused while false.
    active: bool,
}

/// Owns the session history. All mutation funnels through one lock, so an
/// `append` from the ingest task and a `clear` from an observer context
/// never interleave; every effective mutation publishes a cloned snapshot.
pub struct SessionStore {
    inner: Mutex<StoreInner>,
    observable: Arc<ObservableState>,
}

impl SessionStore {
    pub fn new(observable: Arc<ObservableState>) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                sessions: Vec::new(),
                active: false,
            }),
            observable,
        }
    }

    /// Starts a fresh session, unless the current last session is still
    /// empty. Repeated calls without an intervening append keep a single
    /// empty session.
    pub fn start_new_session(&self) {
        let mut inner = self.inner.lock().unwrap();
        let reuse_empty = inner.sessions.last().is_some_and(|s| s.is_empty());
        if !reuse_empty {
            inner.sessions.push(TrackSession::new(Utc::now()));
            tracing::info!(total = inner.sessions.len(), "started new tracking session");
            self.observable.publish_sessions(inner.sessions.clone());
        }
        inner.active = true;
    }

    /// Appends to the active session, suppressing stationary duplicates.
    /// Dropped silently when no session is active.
    pub fn append(&self, fix: LocationFix) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.active {
            tracing::debug!("fix dropped, no active session");
            return;
        }
        let Some(session) = inner.sessions.last_mut() else {
            tracing::debug!("fix dropped, session list is empty");
            return;
        };
        if session.push_fix(fix) {
            self.observable.publish_sessions(inner.sessions.clone());
        }
    }

    /// Removes the session at `index`; out-of-range indices are ignored.
    /// Removing the last session deactivates the store until the next
    /// `start_new_session`, so appends never fall back to an older session.
    pub fn clear(&self, index: usize) {
        let mut inner = self.inner.lock().unwrap();
        if index >= inner.sessions.len() {
            tracing::debug!(index, "clear ignored, index out of range");
            return;
        }
        let was_last = index + 1 == inner.sessions.len();
        inner.sessions.remove(index);
        if was_last {
            inner.active = false;
        }
        tracing::info!(index, remaining = inner.sessions.len(), "cleared tracking session");
        self.observable.publish_sessions(inner.sessions.clone());
    }

    pub fn snapshot(&self) -> Vec<TrackSession> {
        self.inner.lock().unwrap().sessions.clone()
    }
}
