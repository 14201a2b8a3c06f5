//! Sensor-trace generators.
//!
//! - [`FixGenerator`]: synthetic GPS fix streams with jitter, accuracy
//!   dropouts, and profile-driven pace
//! - [`StepTraceGenerator`]: cumulative hardware-style step-counter events

pub mod fixes;
pub mod steps;

pub use fixes::{FixGenerator, GeneratedTrace, TimedFix};
pub use steps::{StepTraceGenerator, TimedStepCount};
