//! Cumulative step-counter trace generation.
//!
//! Hardware step counters report a monotonically increasing total since
//! device boot, so traces start from an arbitrary large offset and only the
//! deltas carry meaning.

use std::time::Duration;

use rand::Rng;

/// One counter reading with its emission offset from the start of the trace.
#[derive(Debug, Clone, Copy)]
pub struct TimedStepCount {
    pub offset: Duration,
    pub raw: u64,
}

/// Generates cumulative counter readings at a fixed reporting interval.
pub struct StepTraceGenerator {
    /// Steps per minute while moving.
    pub cadence_spm: f64,
    /// Raw counter value before the first step of the trace.
    pub counter_offset: u64,
    /// Time between counter reports.
    pub report_interval: Duration,
}

impl Default for StepTraceGenerator {
    fn default() -> Self {
        Self {
            cadence_spm: 160.0,
            counter_offset: 52_840,
            report_interval: Duration::from_secs(2),
        }
    }
}

impl StepTraceGenerator {
    pub fn new(cadence_spm: f64, counter_offset: u64) -> Self {
        Self {
            cadence_spm,
            counter_offset,
            ..Default::default()
        }
    }

    /// Generates readings covering `duration`, with mild cadence wobble.
    pub fn generate(&self, duration: Duration, rng: &mut impl Rng) -> Vec<TimedStepCount> {
        let per_second = self.cadence_spm / 60.0;
        let count = (duration.as_secs_f64() / self.report_interval.as_secs_f64()).floor() as usize;

        let mut readings = Vec::with_capacity(count);
        let mut raw = self.counter_offset as f64;

        for i in 1..=count {
            let wobble = rng.gen_range(0.85..1.15);
            raw += per_second * self.report_interval.as_secs_f64() * wobble;
            readings.push(TimedStepCount {
                offset: self.report_interval * i as u32,
                raw: raw as u64,
            });
        }

        readings
    }

    /// Steps a correctly baselined consumer should report after the whole
    /// trace: last reading minus first reading.
    pub fn expected_steps(readings: &[TimedStepCount]) -> u64 {
        match (readings.first(), readings.last()) {
            (Some(first), Some(last)) => last.raw - first.raw,
            _ => 0,
        }
    }
}
