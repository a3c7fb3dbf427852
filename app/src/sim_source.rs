use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use location_tracker_engine::position_source::{PositionSource, SettingsStatus};
use location_tracker_lib::raw_fix::{RawFix, SpeedSample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

const METERS_PER_DEGREE: f64 = 111_320.0;

/// Stand-in for the platform's fused location provider: a seeded random
/// walk around a base coordinate, with stationary stretches (exercising
/// session de-duplication) and speed samples of mixed quality (exercising
/// window admission).
///
/// Walk state survives resubscription, so an interval change continues
/// the walk instead of jumping back to the base coordinate.
pub struct SimulatedWalkSource {
    state: Arc<Mutex<WalkState>>,
}

struct WalkState {
    latitude: f64,
    longitude: f64,
    rng: StdRng,
    hold_ticks: u32,
    last_fix: Option<RawFix>,
}

impl WalkState {
    fn next_fix(&mut self, interval: Duration) -> RawFix {
        let mut speed = 0.0f64;

        if self.hold_ticks > 0 {
            self.hold_ticks -= 1;
        } else if self.rng.random_bool(0.15) {
            // Stop at the current spot for a few fixes.
            self.hold_ticks = self.rng.random_range(1..=3);
        } else {
            speed = self.rng.random_range(0.6..2.5); // walking pace, m/s
            let heading = self.rng.random_range(0.0..std::f64::consts::TAU);
            let distance = speed * interval.as_secs_f64();
            self.latitude += heading.cos() * distance / METERS_PER_DEGREE;
            self.longitude +=
                heading.sin() * distance / (METERS_PER_DEGREE * self.latitude.to_radians().cos());
        }

        let speed_sample = if self.rng.random_bool(0.2) {
            // Every so often the provider cannot measure speed at all.
            None
        } else {
            Some(SpeedSample {
                meters_per_sec: speed as f32,
                accuracy: self.rng.random_range(0.3f32..2.5),
            })
        };

        let fix = RawFix {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: self.rng.random_range(3.0f32..12.0),
            timestamp: Utc::now(),
            speed: speed_sample,
        };
        self.last_fix = Some(fix.clone());
        fix
    }
}

impl SimulatedWalkSource {
    pub fn new(base_latitude: f64, base_longitude: f64, seed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(WalkState {
                latitude: base_latitude,
                longitude: base_longitude,
                rng: StdRng::seed_from_u64(seed),
                hold_ticks: 0,
                last_fix: None,
            })),
        }
    }
}

impl PositionSource for SimulatedWalkSource {
    fn subscribe(&self, interval_hint: Duration) -> mpsc::Receiver<RawFix> {
        let (tx, rx) = mpsc::channel(32);
        let state = self.state.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval_hint);
            loop {
                ticker.tick().await;
                let fix = state.lock().unwrap().next_fix(interval_hint);
                if tx.send(fix).await.is_err() {
                    break;
                }
            }
        });

        rx
    }

    fn check_settings(&self) -> SettingsStatus {
        SettingsStatus::Satisfied
    }

    fn last_known_fix(&self) -> Option<RawFix> {
        self.state.lock().unwrap().last_fix.clone()
    }
}
