//! Walking pace model.

use super::AthleteProfile;

/// Pace, cadence, and grade response of a simulated walker.
///
/// A default walker stays comfortably inside the engine's walking MET
/// regime, which makes it the profile of choice for exercising the
/// low-speed edge of the calorie model.
#[derive(Debug, Clone)]
pub struct WalkerProfile {
    base_speed_mps: f64,
    cadence_spm: f64,
    variance: f64,
}

impl Default for WalkerProfile {
    fn default() -> Self {
        Self::with_speed(5.0)
    }
}

impl WalkerProfile {
    /// Profile from a flat-ground speed in km/h.
    pub fn with_speed(speed_kmh: f64) -> Self {
        Self {
            base_speed_mps: speed_kmh / 3.6,
            // ~115 spm at 5 km/h, creeping up with speed
            cadence_spm: 100.0 + 3.0 * speed_kmh,
            variance: 0.12,
        }
    }

    /// Brisk walk (~6.5 km/h), just under the running MET boundary.
    pub fn brisk() -> Self {
        Self::with_speed(6.5)
    }

    /// Stroll (~3.5 km/h), slow enough to dip below the engine's
    /// 2.5 km/h tracking floor on uphill stretches.
    pub fn leisurely() -> Self {
        Self::with_speed(3.5)
    }
}

impl AthleteProfile for WalkerProfile {
    fn base_speed_mps(&self) -> f64 {
        self.base_speed_mps
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        // Walking is less grade-sensitive than running in both directions.
        let slope = if grade >= 0.0 { 12.0 } else { 5.0 };
        (1.0 - grade * slope).clamp(0.25, 1.3)
    }

    fn cadence_spm(&self) -> f64 {
        self.cadence_spm
    }

    fn variance(&self) -> f64 {
        self.variance
    }
}
