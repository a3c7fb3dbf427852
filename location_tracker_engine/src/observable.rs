use location_tracker_lib::{location_fix::LocationFix, track_session::TrackSession};
use tokio::sync::watch;

/// Publication side of the engine: three independent state channels read
/// by the UI layer.
///
/// Each channel keeps the latest value. A new subscriber immediately
/// observes the value current at subscribe time and is then notified of
/// every later change; publishing a value equal to the current one is not
/// redelivered. Dropping a receiver has no effect on other subscribers.
pub struct ObservableState {
    location_tx: watch::Sender<Option<LocationFix>>,
    gps_warm_tx: watch::Sender<bool>,
    sessions_tx: watch::Sender<Vec<TrackSession>>,
}

impl ObservableState {
    pub fn new() -> Self {
        let (location_tx, _) = watch::channel(None);
        let (gps_warm_tx, _) = watch::channel(false);
        let (sessions_tx, _) = watch::channel(Vec::new());
        Self {
            location_tx,
            gps_warm_tx,
            sessions_tx,
        }
    }

    pub(crate) fn publish_location(&self, fix: LocationFix) {
        self.location_tx.send_if_modified(|current| {
            if current.as_ref() == Some(&fix) {
                return false;
            }
            *current = Some(fix);
            true
        });
    }

    pub(crate) fn publish_gps_warm(&self, warm: bool) {
        self.gps_warm_tx.send_if_modified(|current| {
            if *current == warm {
                return false;
            }
            *current = warm;
            true
        });
    }

    pub(crate) fn publish_sessions(&self, sessions: Vec<TrackSession>) {
        self.sessions_tx.send_replace(sessions);
    }

    pub fn current_location(&self) -> Option<LocationFix> {
        self.location_tx.borrow().clone()
    }

    pub fn is_gps_warm(&self) -> bool {
        *self.gps_warm_tx.borrow()
    }

    pub fn sessions(&self) -> Vec<TrackSession> {
        self.sessions_tx.borrow().clone()
    }

    pub fn subscribe_location(&self) -> watch::Receiver<Option<LocationFix>> {
        self.location_tx.subscribe()
    }

    pub fn subscribe_gps_warm(&self) -> watch::Receiver<bool> {
        self.gps_warm_tx.subscribe()
    }

    pub fn subscribe_sessions(&self) -> watch::Receiver<Vec<TrackSession>> {
        self.sessions_tx.subscribe()
    }
}

impl Default for ObservableState {
    fn default() -> Self {
        Self::new()
    }
}
