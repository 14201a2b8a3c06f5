//! Engine timing configuration.
//!
//! Only the scheduling knobs live here. The behavioral thresholds (the 20 m
//! accuracy gate, the 2.5 km/h speed floor, the 7.0 km/h walk/run boundary)
//! are contract constants in [`crate::session`] and [`crate::calories`] and
//! are deliberately not configurable.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Period of the accumulation tick while running.
    pub tick_interval: Duration,
    /// Shorter re-check interval while paused, keeping resume latency low
    /// without busy-spinning.
    pub pause_poll_interval: Duration,
    /// Upper bound on the best-effort path-snapshot render at stop.
    pub snapshot_timeout: Duration,
    /// Buffer size for the location and step event channels.
    pub channel_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            pause_poll_interval: Duration::from_millis(500),
            snapshot_timeout: Duration::from_secs(3),
            channel_capacity: 64,
        }
    }
}
