//! Run-tracking engine.
//!
//! Fuses a location-fix stream and a cumulative step-counter stream into one
//! continuously observable run: elapsed time, distance, calories, steps,
//! recorded path, and instantaneous speed, with pause/resume/stop semantics.
//!
//! The [`engine::TrackingEngine`] supervises a single live session; sensor
//! adapters plug in through [`sources::LocationSource`] and
//! [`sources::StepSource`], and finished runs leave through a
//! [`finalize::ResultSink`].

pub mod calories;
pub mod config;
pub mod engine;
pub mod errors;
pub mod finalize;
pub mod models;
pub mod replay;
pub mod session;
pub mod sources;
pub mod status;

pub use config::TrackerConfig;
pub use engine::TrackingEngine;
pub use errors::EngineError;
pub use models::{
    GeoPoint, LocationFix, RunResult, RunSnapshot, SessionPhase, UserProfile,
};
