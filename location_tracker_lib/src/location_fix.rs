use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

/// One published position record: the raw coordinates plus the smoothed
/// speed estimate current at the time of the fix.
///
/// "No data yet" is modelled as the absence of the whole record, never as
/// a record with missing coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub position: Point,
    /// Horizontal accuracy radius in meters.
    pub accuracy: f32,
    pub timestamp: DateTime<Utc>,
    /// Smoothed speed in m/s. Zero until a usable speed sample has arrived.
    pub speed: f32,
}

impl LocationFix {
    pub fn new(position: Point, accuracy: f32, timestamp: DateTime<Utc>, speed: f32) -> Self {
        Self {
            position,
            accuracy,
            timestamp,
            speed,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    pub fn longitude(&self) -> f64 {
        self.position.x()
    }

    /// Same spot on the ground, ignoring time, accuracy and speed.
    pub fn same_position(&self, other: &LocationFix) -> bool {
        self.position == other.position
    }
}
