//! Running pace model.

use super::AthleteProfile;

/// Pace, cadence, and grade response of a simulated runner.
///
/// Defaults to a ~5:00/km recreational runner. The grade response is
/// asymmetric: climbs cost far more pace than descents give back.
#[derive(Debug, Clone)]
pub struct RunnerProfile {
    base_speed_mps: f64,
    cadence_spm: f64,
    variance: f64,
}

impl Default for RunnerProfile {
    fn default() -> Self {
        Self::with_pace(5.0)
    }
}

impl RunnerProfile {
    /// Profile from a flat-ground pace in minutes per kilometer.
    pub fn with_pace(pace_min_per_km: f64) -> Self {
        Self {
            base_speed_mps: 1000.0 / (pace_min_per_km * 60.0),
            // Faster runners turn over quicker; ~160 spm at 5:00/km.
            cadence_spm: (190.0 - 6.0 * pace_min_per_km).max(140.0),
            variance: 0.08,
        }
    }

    /// ~3:30/km base pace.
    pub fn elite() -> Self {
        Self::with_pace(3.5)
    }

    /// ~6:00/km base pace.
    pub fn recreational() -> Self {
        Self::with_pace(6.0)
    }

    pub fn with_cadence(mut self, cadence_spm: f64) -> Self {
        self.cadence_spm = cadence_spm;
        self
    }
}

impl AthleteProfile for RunnerProfile {
    fn base_speed_mps(&self) -> f64 {
        self.base_speed_mps
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        // Lose ~15% of pace per 1% climb, gain ~8% per 1% descent.
        let slope = if grade >= 0.0 { 15.0 } else { 8.0 };
        (1.0 - grade * slope).clamp(0.2, 1.5)
    }

    fn cadence_spm(&self) -> f64 {
        self.cadence_spm
    }

    fn variance(&self) -> f64 {
        self.variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pace_converts_to_speed() {
        let profile = RunnerProfile::with_pace(5.0);
        assert!((profile.base_speed_mps() - 1000.0 / 300.0).abs() < 1e-9);
        assert!(RunnerProfile::elite().base_speed_mps() > profile.base_speed_mps());
    }

    #[test]
    fn test_grade_factors() {
        let profile = RunnerProfile::default();
        assert!((profile.grade_factor(0.0) - 1.0).abs() < 1e-9);
        assert!(profile.grade_factor(0.05) < 1.0);
        assert!(profile.grade_factor(-0.05) > 1.0);
        // Steep grades hit the clamps instead of going negative or absurd
        assert!((profile.grade_factor(0.5) - 0.2).abs() < 1e-9);
        assert!((profile.grade_factor(-0.5) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_cadence_rises_with_pace() {
        assert!(RunnerProfile::elite().cadence_spm() > RunnerProfile::recreational().cadence_spm());
        let custom = RunnerProfile::default().with_cadence(172.0);
        assert_eq!(custom.cadence_spm(), 172.0);
    }
}
