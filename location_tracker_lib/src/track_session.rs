use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::location_fix::LocationFix;

/// One contiguous tracked outing. Fixes are append-only while the session
/// is the active (last) one in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSession {
    pub start_time: DateTime<Utc>,
    pub fixes: Vec<LocationFix>,
}

impl TrackSession {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            fixes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn last_fix(&self) -> Option<&LocationFix> {
        self.fixes.last()
    }

    /// Appends unless the fix sits at the same coordinates as the last
    /// stored one. A stationary device produces a stream of fixes that
    /// differ only in timestamp; those must not grow the session.
    /// Returns whether the fix was stored.
    pub fn push_fix(&mut self, fix: LocationFix) -> bool {
        if let Some(last) = self.fixes.last() {
            if last.same_position(&fix) {
                return false;
            }
        }
        self.fixes.push(fix);
        true
    }
}
