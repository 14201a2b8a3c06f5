//! Configuration types for sensor-stream simulation.

use serde::{Deserialize, Serialize};

/// Geographic bounding box defined by southwest and northeast corners.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude (south)
    pub min_lat: f64,
    /// Minimum longitude (west)
    pub min_lon: f64,
    /// Maximum latitude (north)
    pub max_lat: f64,
    /// Maximum longitude (east)
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Returns a random point within the bounding box.
    pub fn random_point(&self, rng: &mut impl rand::Rng) -> (f64, f64) {
        let lat = rng.gen_range(self.min_lat..self.max_lat);
        let lon = rng.gen_range(self.min_lon..self.max_lon);
        (lat, lon)
    }

    /// Returns the center of the bounding box.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

/// Pre-defined geographic regions for simulated runs.
#[derive(Debug, Clone, Copy)]
pub struct Region;

impl Region {
    /// Boulder, CO area - popular running trails with varied terrain.
    pub const BOULDER: BoundingBox = BoundingBox::new(39.9, -105.5, 40.1, -105.2);

    /// Copenhagen lakes - flat urban running loops.
    pub const COPENHAGEN: BoundingBox = BoundingBox::new(55.65, 12.5, 55.72, 12.62);
}

/// Configuration for one simulated sensor trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seconds between emitted fixes.
    pub fix_interval_s: f64,

    /// GPS position jitter standard deviation in meters.
    pub gps_jitter_m: f64,

    /// Typical horizontal accuracy of a clean fix, in meters.
    pub base_accuracy_m: f64,

    /// Probability that a fix reports garbage accuracy (urban canyon,
    /// indoor start). These must be filtered out by the engine's gate.
    pub bad_fix_probability: f64,

    /// Accuracy reported by a garbage fix, in meters.
    pub bad_fix_accuracy_m: f64,

    /// Probability that a fix omits speed over ground.
    pub missing_speed_probability: f64,

    /// Raw counter value at the start of the trace (hardware counters run
    /// since boot, so this is typically large and arbitrary).
    pub step_counter_offset: u64,

    /// Region the simulated path wanders through.
    pub region: BoundingBox,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fix_interval_s: 1.0,
            gps_jitter_m: 3.0,
            base_accuracy_m: 8.0,
            bad_fix_probability: 0.05,
            bad_fix_accuracy_m: 35.0,
            missing_speed_probability: 0.02,
            step_counter_offset: 52_840,
            region: Region::BOULDER,
        }
    }
}
