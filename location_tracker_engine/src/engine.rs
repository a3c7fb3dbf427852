use std::sync::{Arc, Mutex};
use std::time::Duration;

use location_tracker_lib::location_fix::LocationFix;
use tokio::task::JoinHandle;

use crate::ingestor::{FixIngestor, IngestorConfig};
use crate::observable::ObservableState;
use crate::position_source::PositionSource;
use crate::session_store::SessionStore;

const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// The tracking engine: wires a position source into the ingestion
/// pipeline and the published state.
///
/// One explicitly-constructed instance per composition root; there is no
/// process-wide singleton. Observers read through [`ObservableState`]
/// while the single ingest task writes.
pub struct TrackingEngine {
    source: Arc<dyn PositionSource>,
    ingestor: Arc<Mutex<FixIngestor>>,
    store: Arc<SessionStore>,
    observable: Arc<ObservableState>,
    worker: Mutex<Option<JoinHandle<()>>>,
    interval_hint: Mutex<Duration>,
}

impl TrackingEngine {
    pub fn new(source: Arc<dyn PositionSource>) -> Self {
        Self::with_config(source, IngestorConfig::default())
    }

    pub fn with_config(source: Arc<dyn PositionSource>, config: IngestorConfig) -> Self {
        let observable = Arc::new(ObservableState::new());
        let store = Arc::new(SessionStore::new(observable.clone()));
        let ingestor = Arc::new(Mutex::new(FixIngestor::new(
            config,
            observable.clone(),
            store.clone(),
        )));
        Self {
            source,
            ingestor,
            store,
            observable,
            worker: Mutex::new(None),
            interval_hint: Mutex::new(DEFAULT_INTERVAL),
        }
    }

    /// Subscribes to the position source and starts ingesting fixes. If a
    /// subscription is already live it is replaced, picking up the current
    /// interval hint.
    pub fn start_tracking(&self) {
        self.stop_worker();

        let interval = *self.interval_hint.lock().unwrap();

        if self.observable.current_location().is_none() {
            if let Some(raw) = self.source.last_known_fix() {
                self.observable.publish_location(LocationFix::new(
                    raw.position(),
                    raw.accuracy,
                    raw.timestamp,
                    0.0,
                ));
            }
        }

        let mut fixes = self.source.subscribe(interval);
        let ingestor = self.ingestor.clone();
        let handle = tokio::spawn(async move {
            while let Some(raw) = fixes.recv().await {
                ingestor.lock().unwrap().on_fix(raw);
            }
        });

        *self.worker.lock().unwrap() = Some(handle);
        tracing::info!(interval_ms = interval.as_millis() as u64, "tracking started");
    }

    /// Stops fix delivery and resets the smoothing state. Safe to call
    /// when tracking is not running.
    pub fn stop_tracking(&self) {
        let was_tracking = self.stop_worker();
        self.ingestor.lock().unwrap().on_tracking_stopped();
        if was_tracking {
            tracing::info!("tracking stopped");
        }
    }

    /// Changes the delivery interval hint. A live subscription is
    /// restarted so the new cadence takes effect immediately; filter
    /// state is untouched.
    pub fn set_interval(&self, interval_hint: Duration) {
        *self.interval_hint.lock().unwrap() = interval_hint;
        if self.is_tracking() {
            self.start_tracking();
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.worker
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn start_new_session(&self) {
        self.store.start_new_session();
    }

    pub fn clear_session(&self, index: usize) {
        self.store.clear(index);
    }

    pub fn observable(&self) -> Arc<ObservableState> {
        self.observable.clone()
    }

    fn stop_worker(&self) -> bool {
        match self.worker.lock().unwrap().take() {
            Some(handle) => {
                // The worker holds no lock across its await point, so an
                // in-flight fix finishes before the abort lands.
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for TrackingEngine {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use location_tracker_lib::raw_fix::{RawFix, SpeedSample};
    use location_tracker_lib::track_session::TrackSession;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use super::*;
    use crate::position_source::SettingsStatus;

    /// Source whose fixes are pushed by the test through a channel handed
    /// out at subscribe time.
    struct ScriptedSource {
        subscription: Mutex<Option<mpsc::Sender<RawFix>>>,
        last_known: Option<RawFix>,
    }

    impl ScriptedSource {
        fn new(last_known: Option<RawFix>) -> Self {
            Self {
                subscription: Mutex::new(None),
                last_known,
            }
        }

        fn sender(&self) -> mpsc::Sender<RawFix> {
            self.subscription.lock().unwrap().clone().unwrap()
        }
    }

    impl PositionSource for ScriptedSource {
        fn subscribe(&self, _interval_hint: Duration) -> mpsc::Receiver<RawFix> {
            let (tx, rx) = mpsc::channel(32);
            *self.subscription.lock().unwrap() = Some(tx);
            rx
        }

        fn check_settings(&self) -> SettingsStatus {
            SettingsStatus::Satisfied
        }

        fn last_known_fix(&self) -> Option<RawFix> {
            self.last_known.clone()
        }
    }

    fn raw(lat: f64, lng: f64, millis: i64, speed: Option<SpeedSample>) -> RawFix {
        RawFix {
            latitude: lat,
            longitude: lng,
            accuracy: 5.0,
            timestamp: Utc.timestamp_millis_opt(millis).unwrap(),
            speed,
        }
    }

    async fn next_location(
        rx: &mut tokio::sync::watch::Receiver<Option<LocationFix>>,
    ) -> LocationFix {
        timeout(Duration::from_secs(1), rx.changed())
            .await
            .expect("no location published in time")
            .unwrap();
        rx.borrow_and_update().clone().unwrap()
    }

    async fn wait_for_sessions(
        rx: &mut tokio::sync::watch::Receiver<Vec<TrackSession>>,
        predicate: impl FnMut(&Vec<TrackSession>) -> bool,
    ) -> Vec<TrackSession> {
        timeout(Duration::from_secs(1), rx.wait_for(predicate))
            .await
            .expect("expected session snapshot never published")
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn fixes_flow_from_source_to_observers_and_sessions() {
        let source = Arc::new(ScriptedSource::new(None));
        let engine = TrackingEngine::new(source.clone());
        let observable = engine.observable();
        let mut location_rx = observable.subscribe_location();
        let mut sessions_rx = observable.subscribe_sessions();

        engine.start_new_session();
        engine.start_tracking();
        assert!(engine.is_tracking());

        let tx = source.sender();
        tx.send(raw(1.0, 1.0, 0, None)).await.unwrap();
        assert_eq!(next_location(&mut location_rx).await.latitude(), 1.0);

        tx.send(raw(1.0, 1.0, 1000, None)).await.unwrap();
        assert_eq!(
            next_location(&mut location_rx)
                .await
                .timestamp
                .timestamp_millis(),
            1000
        );

        tx.send(raw(2.0, 2.0, 2000, None)).await.unwrap();
        assert_eq!(next_location(&mut location_rx).await.latitude(), 2.0);

        // The stationary duplicate was published live but not stored.
        let sessions =
            wait_for_sessions(&mut sessions_rx, |s| s.len() == 1 && s[0].len() == 2).await;
        assert_eq!(sessions[0].fixes[0].latitude(), 1.0);
        assert_eq!(sessions[0].fixes[1].latitude(), 2.0);

        assert!(observable.is_gps_warm());
    }

    #[tokio::test]
    async fn stop_tracking_resets_state_and_keeps_coordinates() {
        let source = Arc::new(ScriptedSource::new(None));
        let engine = TrackingEngine::new(source.clone());
        let observable = engine.observable();
        let mut location_rx = observable.subscribe_location();

        engine.start_new_session();
        engine.start_tracking();

        let tx = source.sender();
        tx.send(raw(1.0, 1.0, 0, Some(SpeedSample { meters_per_sec: 6.0, accuracy: 2.0 })))
            .await
            .unwrap();
        let published = next_location(&mut location_rx).await;
        assert_eq!(published.speed, 6.0);

        engine.stop_tracking();
        assert!(!engine.is_tracking());

        let after_stop = observable.current_location().unwrap();
        assert_eq!(after_stop.speed, 0.0);
        assert_eq!(after_stop.latitude(), 1.0);
        assert!(!observable.is_gps_warm());

        // Stopping again stays a no-op.
        engine.stop_tracking();
        assert!(!engine.is_tracking());
    }

    #[tokio::test]
    async fn restart_appends_into_a_fresh_session() {
        let source = Arc::new(ScriptedSource::new(None));
        let engine = TrackingEngine::new(source.clone());
        let observable = engine.observable();
        let mut sessions_rx = observable.subscribe_sessions();

        engine.start_new_session();
        engine.start_tracking();
        source
            .sender()
            .send(raw(1.0, 1.0, 0, None))
            .await
            .unwrap();
        wait_for_sessions(&mut sessions_rx, |s| s.len() == 1 && s[0].len() == 1).await;
        engine.stop_tracking();

        engine.start_new_session();
        engine.start_tracking();
        source
            .sender()
            .send(raw(2.0, 2.0, 10_000, None))
            .await
            .unwrap();

        let sessions =
            wait_for_sessions(&mut sessions_rx, |s| s.len() == 2 && s[1].len() == 1).await;
        assert_eq!(sessions[0].fixes[0].latitude(), 1.0);
        assert_eq!(sessions[1].fixes[0].latitude(), 2.0);
    }

    #[tokio::test]
    async fn last_known_fix_seeds_current_location() {
        let seed = raw(7.0, 8.0, 500, None);
        let source = Arc::new(ScriptedSource::new(Some(seed)));
        let engine = TrackingEngine::new(source.clone());
        let observable = engine.observable();

        engine.start_tracking();

        let location = observable.current_location().unwrap();
        assert_eq!(location.latitude(), 7.0);
        assert_eq!(location.speed, 0.0);
        // Seeding is presentation only; the GPS is still cold.
        assert!(!observable.is_gps_warm());
    }

    #[tokio::test]
    async fn set_interval_restarts_a_live_subscription() {
        let source = Arc::new(ScriptedSource::new(None));
        let engine = TrackingEngine::new(source.clone());
        let observable = engine.observable();
        let mut location_rx = observable.subscribe_location();

        engine.start_new_session();
        engine.start_tracking();
        let first_tx = source.sender();

        engine.set_interval(Duration::from_millis(200));
        assert!(engine.is_tracking());

        // The old subscription is dead; the replacement delivers.
        let second_tx = source.sender();
        assert!(!second_tx.same_channel(&first_tx));
        second_tx.send(raw(1.0, 1.0, 0, None)).await.unwrap();
        assert_eq!(next_location(&mut location_rx).await.latitude(), 1.0);
    }

    #[tokio::test]
    async fn set_interval_while_idle_does_not_start_tracking() {
        let source = Arc::new(ScriptedSource::new(None));
        let engine = TrackingEngine::new(source);

        engine.set_interval(Duration::from_millis(200));
        assert!(!engine.is_tracking());
    }

    #[tokio::test]
    async fn clearing_the_live_session_drops_following_fixes() {
        let source = Arc::new(ScriptedSource::new(None));
        let engine = TrackingEngine::new(source.clone());
        let observable = engine.observable();
        let mut location_rx = observable.subscribe_location();
        let mut sessions_rx = observable.subscribe_sessions();

        engine.start_new_session();
        engine.start_tracking();

        let tx = source.sender();
        tx.send(raw(1.0, 1.0, 0, None)).await.unwrap();
        next_location(&mut location_rx).await;
        wait_for_sessions(&mut sessions_rx, |s| s.len() == 1 && s[0].len() == 1).await;

        engine.clear_session(0);

        tx.send(raw(2.0, 2.0, 1000, None)).await.unwrap();
        // Still published live even though no session will store it.
        assert_eq!(next_location(&mut location_rx).await.latitude(), 2.0);
        assert!(observable.sessions().is_empty());
    }
}
