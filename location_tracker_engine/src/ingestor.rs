use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use location_tracker_lib::{location_fix::LocationFix, raw_fix::RawFix};

use crate::observable::ObservableState;
use crate::session_store::SessionStore;
use crate::speed_filter::SpeedWindow;

/// Tuning knobs for fix ingestion.
#[derive(Debug, Clone)]
pub struct IngestorConfig {
    /// Number of raw speed samples the smoothing window holds.
    pub speed_window_len: usize,

    /// Samples whose reported speed accuracy does not exceed this are
    /// treated as noise and kept out of the window.
    pub speed_accuracy_floor: f32,

    /// Maximum gap between consecutive fixes for the GPS to count as warm.
    pub warm_threshold: Duration,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            speed_window_len: 10,
            speed_accuracy_floor: 1.0,
            warm_threshold: Duration::from_secs(5),
        }
    }
}

/// Turns raw fixes into published location records: smooths the speed,
/// derives the warm flag and hands the record on to the session store.
///
/// Exactly one ingest task calls `on_fix` at a time; the struct itself
/// needs no interior locking.
pub struct FixIngestor {
    config: IngestorConfig,
    window: SpeedWindow,
    previous_fix_time: Option<DateTime<Utc>>,
    observable: Arc<ObservableState>,
    store: Arc<SessionStore>,
}

impl FixIngestor {
    pub fn new(
        config: IngestorConfig,
        observable: Arc<ObservableState>,
        store: Arc<SessionStore>,
    ) -> Self {
        let window = SpeedWindow::new(config.speed_window_len);
        Self {
            config,
            window,
            previous_fix_time: None,
            observable,
            store,
        }
    }

    /// Processes one raw fix, in delivery order.
    pub fn on_fix(&mut self, raw: RawFix) {
        if let Some(sample) = raw.speed {
            if sample.accuracy > self.config.speed_accuracy_floor {
                self.window.push(sample.meters_per_sec);
            }
        }

        let warm = self.previous_fix_time.is_some_and(|previous| {
            let gap = raw.timestamp.signed_duration_since(previous);
            gap.num_milliseconds() < self.config.warm_threshold.as_millis() as i64
        });
        self.previous_fix_time = Some(raw.timestamp);

        let fix = LocationFix::new(
            raw.position(),
            raw.accuracy,
            raw.timestamp,
            self.window.mean(),
        );

        tracing::debug!(
            lat = fix.latitude(),
            lng = fix.longitude(),
            speed = fix.speed,
            warm,
            "ingested fix"
        );

        self.observable.publish_gps_warm(warm);
        // Current location updates on every fix, stationary or not.
        self.observable.publish_location(fix.clone());
        self.store.append(fix);
    }

    /// Reset contract for the end of tracking: drops the smoothing state
    /// and republishes the last known position with its speed zeroed.
    /// Idempotent, safe to call when no fix was ever ingested.
    pub fn on_tracking_stopped(&mut self) {
        self.window.clear();
        self.previous_fix_time = None;
        self.observable.publish_gps_warm(false);
        if let Some(last) = self.observable.current_location() {
            self.observable.publish_location(LocationFix { speed: 0.0, ..last });
        }
    }
}
