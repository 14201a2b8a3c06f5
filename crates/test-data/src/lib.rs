//! Synthetic sensor data for exercising the tracking engine.
//!
//! Generates reproducible GPS fix streams and hardware-style step-counter
//! traces, feeds them through engine-pluggable sources, and scripts whole
//! sessions end to end. Every generator takes an explicit RNG so a seed
//! pins the entire run.

pub mod config;
pub mod generators;
pub mod profiles;
pub mod scenario;
pub mod sources;
pub mod terrain;

pub use config::{BoundingBox, Region, SimConfig};
pub use generators::{FixGenerator, GeneratedTrace, StepTraceGenerator};
pub use scenario::{ScenarioBuilder, ScenarioOutcome};
pub use sources::{SimLocationSource, SimStepSource};
pub use terrain::ElevationGenerator;
