//! Engine-pluggable sources that emit generated traces.
//!
//! Both sources keep their position across unsubscribe/resubscribe, the way
//! real hardware keeps existing: pausing the engine stops delivery, but the
//! world (and the step counter) picks up where it left off on resume.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tracker::models::LocationFix;
use tracker::sources::{LocationSource, StepSource, Subscription};

use crate::generators::{GeneratedTrace, TimedFix, TimedStepCount};

/// Emits a generated fix trace on the trace's own schedule.
pub struct SimLocationSource {
    trace: Arc<Vec<TimedFix>>,
    cursor: Arc<AtomicUsize>,
    speedup: f64,
}

impl SimLocationSource {
    pub fn new(trace: &GeneratedTrace) -> Self {
        Self {
            trace: Arc::new(trace.fixes.clone()),
            cursor: Arc::new(AtomicUsize::new(0)),
            speedup: 1.0,
        }
    }

    /// Emits the trace `speedup` times faster than its recorded offsets.
    pub fn with_speedup(mut self, speedup: f64) -> Self {
        self.speedup = speedup.max(1e-9);
        self
    }

    /// Fixes emitted so far.
    pub fn emitted(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl LocationSource for SimLocationSource {
    fn subscribe(&self, sink: mpsc::Sender<LocationFix>) -> Subscription {
        let trace = self.trace.clone();
        let cursor = self.cursor.clone();
        let speedup = self.speedup;
        let task = tokio::spawn(async move {
            loop {
                let i = cursor.load(Ordering::SeqCst);
                let Some(timed) = trace.get(i) else { return };
                tokio::time::sleep(gap_before(&trace, i).div_f64(speedup)).await;
                if sink.send(timed.fix).await.is_err() {
                    return;
                }
                cursor.store(i + 1, Ordering::SeqCst);
            }
        });
        Subscription::from_task(task.abort_handle())
    }
}

fn gap_before(trace: &[TimedFix], i: usize) -> Duration {
    if i == 0 {
        trace[0].offset
    } else {
        trace[i].offset - trace[i - 1].offset
    }
}

/// Emits a generated step-counter trace on its schedule.
pub struct SimStepSource {
    readings: Arc<Vec<TimedStepCount>>,
    cursor: Arc<AtomicUsize>,
    speedup: f64,
}

impl SimStepSource {
    pub fn new(readings: Vec<TimedStepCount>) -> Self {
        Self {
            readings: Arc::new(readings),
            cursor: Arc::new(AtomicUsize::new(0)),
            speedup: 1.0,
        }
    }

    pub fn with_speedup(mut self, speedup: f64) -> Self {
        self.speedup = speedup.max(1e-9);
        self
    }
}

impl StepSource for SimStepSource {
    fn subscribe(&self, sink: mpsc::Sender<u64>) -> Subscription {
        let readings = self.readings.clone();
        let cursor = self.cursor.clone();
        let speedup = self.speedup;
        let task = tokio::spawn(async move {
            loop {
                let i = cursor.load(Ordering::SeqCst);
                let Some(timed) = readings.get(i) else { return };
                let gap = if i == 0 {
                    timed.offset
                } else {
                    timed.offset - readings[i - 1].offset
                };
                tokio::time::sleep(gap.div_f64(speedup)).await;
                if sink.send(timed.raw).await.is_err() {
                    return;
                }
                cursor.store(i + 1, Ordering::SeqCst);
            }
        });
        Subscription::from_task(task.abort_handle())
    }
}
