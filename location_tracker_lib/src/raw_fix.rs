use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

/// Speed as reported by the position source, together with the source's
/// own confidence estimate for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    pub meters_per_sec: f32,
    pub accuracy: f32,
}

/// One fix as delivered by a position source, before any smoothing.
/// `speed` is `None` when the source could not measure speed for this fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters.
    pub accuracy: f32,
    pub timestamp: DateTime<Utc>,
    pub speed: Option<SpeedSample>,
}

impl RawFix {
    /// Coordinates as a point, x = longitude, y = latitude.
    pub fn position(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}
