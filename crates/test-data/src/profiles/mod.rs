//! Athletic performance profiles.
//!
//! Profiles define realistic pace, step cadence, and grade response for the
//! activity types the engine tracks. The fix generator reads speed from a
//! profile; the step-trace generator reads its cadence, so both sensor
//! streams describe the same simulated athlete.

mod runner;
mod walker;

pub use runner::RunnerProfile;
pub use walker::WalkerProfile;

/// Trait for athletic performance profiles.
pub trait AthleteProfile: Send + Sync {
    /// Base speed on flat terrain in meters per second.
    fn base_speed_mps(&self) -> f64;

    /// Speed multiplier for a given grade (expressed as a fraction, e.g., 0.05 = 5% grade).
    ///
    /// < 1.0 means slower than base (uphill), > 1.0 faster (downhill).
    fn grade_factor(&self, grade: f64) -> f64;

    /// Step cadence while moving, in steps per minute.
    fn cadence_spm(&self) -> f64;

    /// Day-to-day performance variance as a coefficient of variation (0.0 - 1.0).
    fn variance(&self) -> f64;
}

/// Grade- and variance-adjusted speed for a profile.
pub fn speed_at_grade(profile: &dyn AthleteProfile, grade: f64, variance_factor: f64) -> f64 {
    let base = profile.base_speed_mps();
    let factor = profile.grade_factor(grade);
    let target = base * factor;

    (target * variance_factor).max(0.5) // Minimum 0.5 m/s to avoid division issues
}

/// Samples a variance factor from a normal distribution around 1.0.
pub fn sample_variance(profile: &dyn AthleteProfile, rng: &mut impl rand::Rng) -> f64 {
    use rand_distr::{Distribution, Normal};

    let std_dev = profile.variance();
    if std_dev > 0.0 {
        let normal = Normal::new(1.0, std_dev).unwrap();
        let sample: f64 = normal.sample(rng);
        sample.clamp(0.7, 1.4)
    } else {
        1.0
    }
}
