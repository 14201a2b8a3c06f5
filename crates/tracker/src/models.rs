use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Body metrics supplied at session creation. Immutable for the session;
/// only the calorie model reads it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UserProfile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: u32,
}

impl UserProfile {
    pub fn new(weight_kg: f64, height_cm: f64, age_years: u32) -> Self {
        Self {
            weight_kg,
            height_cm,
            age_years,
        }
    }
}

/// A recorded path coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        // geo points are (x, y) = (lon, lat)
        geo::Point::new(p.longitude, p.latitude)
    }
}

/// A single location sample as delivered by a [`LocationSource`].
///
/// `speed_mps` is the reported speed over ground, when the fix carries one.
/// `horizontal_accuracy_m` is the error estimate in meters; fixes worse than
/// the engine's gate are discarded wholesale.
///
/// [`LocationSource`]: crate::sources::LocationSource
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub horizontal_accuracy_m: f64,
    pub speed_mps: Option<f64>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, horizontal_accuracy_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            horizontal_accuracy_m,
            speed_mps: None,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Lifecycle phase of a tracking session. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Running,
    Paused,
    Stopped,
}

/// Observable projection of the live session, published on every tick and
/// every accepted sensor event.
///
/// The path is shared via `Arc` so per-tick publication stays cheap over
/// long sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub phase: SessionPhase,
    pub elapsed_seconds: u64,
    pub distance_meters: f64,
    pub calories: f64,
    pub steps: u64,
    pub current_speed_kmh: f64,
    pub path: Arc<Vec<GeoPoint>>,
}

impl RunSnapshot {
    /// Snapshot published before any session has started.
    pub fn idle() -> Self {
        Self {
            phase: SessionPhase::Stopped,
            elapsed_seconds: 0,
            distance_meters: 0.0,
            calories: 0.0,
            steps: 0,
            current_speed_kmh: 0.0,
            path: Arc::new(Vec::new()),
        }
    }

    pub fn paused(&self) -> bool {
        self.phase == SessionPhase::Paused
    }
}

/// Immutable summary of a finished session, produced exactly once at stop
/// and handed to the configured [`ResultSink`].
///
/// `avg_speed_kmh` carries the last instantaneous speed estimate, matching
/// the historical behavior of the summary screen. `calories` is the precise
/// accumulator rounded to the nearest whole kcal.
///
/// [`ResultSink`]: crate::finalize::ResultSink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub id: Uuid,
    pub started_at: OffsetDateTime,
    pub finished_at: OffsetDateTime,
    pub distance_meters: f64,
    pub elapsed_seconds: u64,
    pub calories: u32,
    pub avg_speed_kmh: f64,
    pub steps: u64,
    pub path: Vec<GeoPoint>,
    /// Rendered path-snapshot image, when the provider delivered one in time.
    pub snapshot_image: Option<PathBuf>,
}
