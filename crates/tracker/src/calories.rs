//! MET-based calorie model.
//!
//! An approximation, not a medically precise model, but the constants are a
//! behavioral contract: speeds below 2.5 km/h are treated as GPS drift and
//! contribute nothing, the walking regime ends at 7.0 km/h, and energy rate
//! follows the standard `met * 3.5 * weight / 200` kcal-per-minute formula.

/// Speeds below this are indistinguishable from GPS noise while standing.
pub const MIN_TRACKED_SPEED_KMH: f64 = 2.5;

/// Boundary between the walking and running MET regimes.
pub const WALK_RUN_BOUNDARY_KMH: f64 = 7.0;

const WALK_MET_PER_KMH: f64 = 0.7;
const RUN_MET_PER_KMH: f64 = 1.0;

/// Metabolic equivalent for a given speed. Zero below the tracking floor.
pub fn met_for_speed(speed_kmh: f64) -> f64 {
    if speed_kmh < MIN_TRACKED_SPEED_KMH {
        0.0
    } else if speed_kmh <= WALK_RUN_BOUNDARY_KMH {
        speed_kmh * WALK_MET_PER_KMH
    } else {
        speed_kmh * RUN_MET_PER_KMH
    }
}

/// Energy burned in one second at the given speed and body weight.
///
/// Fed once per active tick into the session's high-precision accumulator so
/// rounding error cannot compound over long sessions.
pub fn kcal_per_second(speed_kmh: f64, weight_kg: f64) -> f64 {
    let met = met_for_speed(speed_kmh);
    if met == 0.0 {
        return 0.0;
    }
    let kcal_per_minute = met * 3.5 * weight_kg / 200.0;
    kcal_per_minute / 60.0
}
