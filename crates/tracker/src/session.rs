//! Mutable state of one tracking session.
//!
//! [`RunState`] is owned by exactly one session task; every mutation goes
//! through it, so the accumulation logic stays synchronous and testable
//! without any of the surrounding channel plumbing.

use std::path::PathBuf;
use std::sync::Arc;

use geo::{Distance as _, Haversine, Point};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::calories;
use crate::models::{GeoPoint, LocationFix, RunResult, RunSnapshot, SessionPhase, UserProfile};

/// Fixes with a worse horizontal error estimate than this are discarded:
/// no distance, no path append, no speed update.
pub const ACCURACY_LIMIT_M: f64 = 20.0;

const MPS_TO_KMH: f64 = 3.6;

/// The authoritative run state: elapsed time, accumulated distance, calories,
/// steps, recorded path, and the instantaneous speed estimate.
#[derive(Debug)]
pub struct RunState {
    id: Uuid,
    profile: UserProfile,
    started_at: OffsetDateTime,
    phase: SessionPhase,
    elapsed_seconds: u64,
    distance_meters: f64,
    /// High-precision calorie accumulator; rounded only at the edges.
    calories: f64,
    steps: u64,
    /// Raw hardware counter value at the first event of the session.
    /// Established once and never rebaselined, so steps stay cumulative
    /// across pause/resume cycles.
    initial_step_count: Option<u64>,
    last_location: Option<Point<f64>>,
    current_speed_kmh: f64,
    path: Vec<GeoPoint>,
}

impl RunState {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile,
            started_at: OffsetDateTime::now_utc(),
            phase: SessionPhase::Running,
            elapsed_seconds: 0,
            distance_meters: 0.0,
            calories: 0.0,
            steps: 0,
            initial_step_count: None,
            last_location: None,
            current_speed_kmh: 0.0,
            path: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
    }

    /// One second of active tracking: advances the clock and runs the
    /// calorie accumulation step at the current speed estimate.
    ///
    /// Callers only invoke this while the session is `Running`; a paused
    /// session ticks without accumulating.
    pub fn tick(&mut self) {
        self.elapsed_seconds += 1;
        self.calories += calories::kcal_per_second(self.current_speed_kmh, self.profile.weight_kg);
    }

    /// Folds one location fix into distance, speed, and path.
    ///
    /// Returns `false` when the fix fails the accuracy gate and was dropped
    /// in its entirety.
    pub fn ingest_fix(&mut self, fix: &LocationFix) -> bool {
        if fix.horizontal_accuracy_m > ACCURACY_LIMIT_M {
            return false;
        }

        let here = Point::from(fix.point());
        self.distance_meters += self
            .last_location
            .map_or(0.0, |prev| Haversine.distance(prev, here));
        self.last_location = Some(here);

        self.current_speed_kmh = fix.speed_mps.map_or(0.0, |mps| mps * MPS_TO_KMH);
        self.path.push(fix.point());
        true
    }

    /// Folds one cumulative step-counter reading into the session total.
    ///
    /// The first reading of the session becomes the baseline; readings below
    /// the baseline floor the total at zero rather than rebaselining.
    pub fn ingest_steps(&mut self, raw: u64) {
        let baseline = *self.initial_step_count.get_or_insert(raw);
        self.steps = raw.saturating_sub(baseline);
    }

    pub fn path(&self) -> &[GeoPoint] {
        &self.path
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            phase: self.phase,
            elapsed_seconds: self.elapsed_seconds,
            distance_meters: self.distance_meters,
            calories: self.calories,
            steps: self.steps,
            current_speed_kmh: self.current_speed_kmh,
            path: Arc::new(self.path.clone()),
        }
    }

    /// Freezes the session into its immutable summary. Consumes the state;
    /// nothing can mutate a finalized session.
    pub fn finalize(mut self, snapshot_image: Option<PathBuf>) -> RunResult {
        self.phase = SessionPhase::Stopped;
        RunResult {
            id: self.id,
            started_at: self.started_at,
            finished_at: OffsetDateTime::now_utc(),
            distance_meters: self.distance_meters,
            elapsed_seconds: self.elapsed_seconds,
            calories: self.calories.round() as u32,
            avg_speed_kmh: self.current_speed_kmh,
            steps: self.steps,
            path: self.path,
            snapshot_image,
        }
    }
}
