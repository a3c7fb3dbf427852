use std::time::Duration;

use location_tracker_lib::raw_fix::RawFix;
use tokio::sync::mpsc;

/// Outcome of asking the platform whether location delivery can proceed.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsStatus {
    /// Location delivery is ready.
    Satisfied,
    /// The platform can fix the problem if the user confirms; the handle
    /// is whatever opaque token the platform needs to launch that flow.
    NeedsResolution(String),
    /// Location delivery cannot be enabled on this device.
    Unavailable,
}

/// Seam to the platform's positioning stack.
///
/// Implementations own all blocking I/O, permission handling and retry
/// policy. The engine only consumes the fix channel; fixes arrive
/// serialized, never concurrently.
pub trait PositionSource: Send + Sync {
    /// Starts fix delivery at roughly one fix per `interval_hint`.
    /// Dropping the receiver cancels the subscription.
    fn subscribe(&self, interval_hint: Duration) -> mpsc::Receiver<RawFix>;

    /// Checks whether the platform's location settings allow delivery.
    fn check_settings(&self) -> SettingsStatus;

    /// Best-effort immediate snapshot, available without a subscription.
    fn last_known_fix(&self) -> Option<RawFix>;
}
