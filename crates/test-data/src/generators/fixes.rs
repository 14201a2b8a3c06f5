//! Procedural GPS fix-stream generation.

use std::time::Duration;

use geo::{Distance as _, Haversine, Point};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracker::models::LocationFix;

use crate::config::SimConfig;
use crate::profiles::{self, AthleteProfile};
use crate::terrain::ElevationGenerator;

/// One fix with its emission offset from the start of the trace.
#[derive(Debug, Clone, Copy)]
pub struct TimedFix {
    pub offset: Duration,
    pub fix: LocationFix,
}

/// A complete generated fix trace plus the ground truth the engine should
/// reconstruct from it.
#[derive(Debug, Clone)]
pub struct GeneratedTrace {
    pub fixes: Vec<TimedFix>,
    /// Haversine distance over the gate-passing fixes, in emission order.
    /// This is exactly what a correct fusion should accumulate.
    pub clean_distance_m: f64,
    /// Number of fixes that should fail the 20 m accuracy gate.
    pub rejected_fixes: usize,
    /// Total emission time of the trace.
    pub duration: Duration,
}

/// Generates a random-walk fix stream with realistic pace, GPS jitter, and
/// occasional garbage-accuracy fixes.
pub struct FixGenerator {
    config: SimConfig,
    elevation: ElevationGenerator,
}

impl FixGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            config: SimConfig::default(),
            elevation: ElevationGenerator::foothills(seed),
        }
    }

    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_elevation(mut self, elevation: ElevationGenerator) -> Self {
        self.elevation = elevation;
        self
    }

    /// Generates a trace covering `duration` of simulated movement using the
    /// given athletic profile.
    pub fn generate(
        &self,
        profile: &dyn AthleteProfile,
        duration: Duration,
        rng: &mut impl Rng,
    ) -> GeneratedTrace {
        let cfg = &self.config;
        let interval = Duration::from_secs_f64(cfg.fix_interval_s);
        let count = (duration.as_secs_f64() / cfg.fix_interval_s).ceil() as usize;

        let jitter = Normal::new(0.0, cfg.gps_jitter_m / 111_000.0).unwrap();
        let accuracy_noise = Normal::new(0.0, cfg.base_accuracy_m * 0.2).unwrap();

        let mut current = cfg.region.random_point(rng);
        // Random walk with momentum, bouncing off the region bounds.
        let mut heading = rng.gen_range(0.0..std::f64::consts::TAU);

        let mut fixes = Vec::with_capacity(count);
        let mut clean_distance_m = 0.0;
        let mut rejected_fixes = 0;
        let mut last_clean: Option<Point<f64>> = None;

        for i in 0..count {
            let offset = interval * i as u32;

            // Pace from terrain grade at the current position.
            let ahead = (
                current.0 + 0.0005 * heading.cos(),
                current.1 + 0.0005 * heading.sin(),
            );
            let here_elev = self.elevation.elevation_at(current.0, current.1);
            let ahead_elev = self.elevation.elevation_at(ahead.0, ahead.1);
            let grade = (ahead_elev - here_elev) / 55.0; // ~55 m lookahead

            let variance = profiles::sample_variance(profile, rng);
            let speed_mps = profiles::speed_at_grade(profile, grade, variance);

            // Advance the walk by one interval of movement.
            heading += rng.gen_range(-0.3..0.3);
            let step_m = speed_mps * cfg.fix_interval_s;
            let lat_delta = (step_m * heading.cos()) / 111_000.0;
            let lon_delta = (step_m * heading.sin()) / (111_000.0 * current.0.to_radians().cos());
            let (lat, lon, bounced) =
                apply_bounds(&cfg.region, current.0 + lat_delta, current.1 + lon_delta, heading);
            heading = bounced;
            current = (lat, lon);

            let reported_lat = lat + jitter.sample(rng);
            let reported_lon = lon + jitter.sample(rng);

            let bad = rng.r#gen::<f64>() < cfg.bad_fix_probability;
            let accuracy = if bad {
                cfg.bad_fix_accuracy_m
            } else {
                (cfg.base_accuracy_m + accuracy_noise.sample(rng)).max(1.0)
            };

            let mut fix = LocationFix::new(reported_lat, reported_lon, accuracy);
            if rng.r#gen::<f64>() >= cfg.missing_speed_probability {
                fix = fix.with_speed(speed_mps);
            }

            if bad {
                rejected_fixes += 1;
            } else {
                let here = Point::new(reported_lon, reported_lat);
                if let Some(prev) = last_clean {
                    clean_distance_m += Haversine.distance(prev, here);
                }
                last_clean = Some(here);
            }

            fixes.push(TimedFix { offset, fix });
        }

        GeneratedTrace {
            fixes,
            clean_distance_m,
            rejected_fixes,
            duration: interval * count as u32,
        }
    }
}

fn apply_bounds(
    bounds: &crate::config::BoundingBox,
    lat: f64,
    lon: f64,
    heading: f64,
) -> (f64, f64, f64) {
    let mut new_heading = heading;

    let lat = if lat < bounds.min_lat {
        new_heading = std::f64::consts::PI - heading;
        bounds.min_lat + (bounds.min_lat - lat).min(0.001)
    } else if lat > bounds.max_lat {
        new_heading = std::f64::consts::PI - heading;
        bounds.max_lat - (lat - bounds.max_lat).min(0.001)
    } else {
        lat
    };

    let lon = if lon < bounds.min_lon {
        new_heading = -heading;
        bounds.min_lon + (bounds.min_lon - lon).min(0.001)
    } else if lon > bounds.max_lon {
        new_heading = -heading;
        bounds.max_lon - (lon - bounds.max_lon).min(0.001)
    } else {
        lon
    };

    (lat, lon, new_heading)
}
