//! Scripted end-to-end runs against a real [`TrackingEngine`].
//!
//! A scenario generates a sensor trace, wires it into an engine through the
//! simulated sources, drives the session lifecycle on a script, and returns
//! everything needed to check the engine's arithmetic against the trace's
//! ground truth.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracker::engine::TrackingEngine;
use tracker::finalize::DiscardSink;
use tracker::models::{RunResult, RunSnapshot, UserProfile};

use crate::config::SimConfig;
use crate::generators::{FixGenerator, GeneratedTrace, StepTraceGenerator};
use crate::profiles::{AthleteProfile, RunnerProfile};
use crate::sources::{SimLocationSource, SimStepSource};

enum ScriptAction {
    Wait(Duration),
    Pause,
    Resume,
}

/// Builds and runs one scripted session.
pub struct ScenarioBuilder {
    seed: u64,
    duration: Duration,
    config: SimConfig,
    athlete: UserProfile,
    script: Vec<ScriptAction>,
}

/// The frozen result plus everything observed and generated along the way.
pub struct ScenarioOutcome {
    pub result: RunResult,
    /// Every snapshot published over the watch channel, in order.
    pub snapshots: Vec<RunSnapshot>,
    pub trace: GeneratedTrace,
    /// Steps a correct baseline should report for the full step trace.
    pub expected_steps: u64,
}

impl ScenarioBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            duration: Duration::from_secs(120),
            config: SimConfig::default(),
            athlete: UserProfile::new(70.0, 178.0, 30),
            script: Vec::new(),
        }
    }

    /// Length of the generated sensor traces.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_athlete(mut self, athlete: UserProfile) -> Self {
        self.athlete = athlete;
        self
    }

    pub fn then_wait(mut self, duration: Duration) -> Self {
        self.script.push(ScriptAction::Wait(duration));
        self
    }

    pub fn then_pause(mut self) -> Self {
        self.script.push(ScriptAction::Pause);
        self
    }

    pub fn then_resume(mut self) -> Self {
        self.script.push(ScriptAction::Resume);
        self
    }

    /// Generates the traces, runs the script against a live engine, and stops
    /// the session once the script is exhausted.
    ///
    /// An empty script waits out the whole trace plus a couple of ticks, so
    /// every generated event reaches the engine before the stop.
    pub async fn run(self) -> ScenarioOutcome {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let profile = RunnerProfile::default();
        let trace = FixGenerator::new(self.seed as u32)
            .with_config(self.config.clone())
            .generate(&profile, self.duration, &mut rng);
        let readings =
            StepTraceGenerator::new(profile.cadence_spm(), self.config.step_counter_offset)
                .generate(self.duration, &mut rng);
        let expected_steps = StepTraceGenerator::expected_steps(&readings);

        let engine = TrackingEngine::new(
            Arc::new(SimLocationSource::new(&trace)),
            Arc::new(SimStepSource::new(readings)),
            Arc::new(DiscardSink),
        );

        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let mut watch_rx = engine.watch();
        let collector = {
            let snapshots = snapshots.clone();
            tokio::spawn(async move {
                while watch_rx.changed().await.is_ok() {
                    let snap = watch_rx.borrow_and_update().clone();
                    snapshots.lock().unwrap().push(snap);
                }
            })
        };

        let script = if self.script.is_empty() {
            vec![ScriptAction::Wait(self.duration + Duration::from_secs(3))]
        } else {
            self.script
        };

        engine
            .start(self.athlete)
            .await
            .unwrap_or_else(|e| panic!("scenario start failed: {e}"));

        for action in script {
            match action {
                ScriptAction::Wait(d) => tokio::time::sleep(d).await,
                ScriptAction::Pause => {
                    engine
                        .pause()
                        .await
                        .unwrap_or_else(|e| panic!("scenario pause failed: {e}"));
                }
                ScriptAction::Resume => {
                    engine
                        .resume()
                        .await
                        .unwrap_or_else(|e| panic!("scenario resume failed: {e}"));
                }
            }
        }

        let result = engine
            .stop()
            .await
            .unwrap_or_else(|e| panic!("scenario stop failed: {e}"));

        collector.abort();
        let snapshots = std::mem::take(&mut *snapshots.lock().unwrap());

        ScenarioOutcome {
            result,
            snapshots,
            trace,
            expected_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker::models::SessionPhase;

    #[tokio::test(start_paused = true)]
    async fn test_distance_matches_clean_trace_distance() {
        let outcome = ScenarioBuilder::new(42)
            .with_duration(Duration::from_secs(180))
            .run()
            .await;

        // The engine accumulates haversine over exactly the gate-passing
        // fixes, in order, so the totals agree to float precision.
        let diff = (outcome.result.distance_meters - outcome.trace.clean_distance_m).abs();
        assert!(
            diff < 1e-6,
            "engine {} m vs trace {} m",
            outcome.result.distance_meters,
            outcome.trace.clean_distance_m
        );
        assert_eq!(
            outcome.result.path.len(),
            outcome.trace.fixes.len() - outcome.trace.rejected_fixes
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_match_hardware_counter_deltas() {
        let outcome = ScenarioBuilder::new(7)
            .with_duration(Duration::from_secs(120))
            .run()
            .await;

        assert_eq!(outcome.result.steps, outcome.expected_steps);
        assert!(outcome.expected_steps > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observed_snapshots_never_regress() {
        let outcome = ScenarioBuilder::new(3)
            .with_duration(Duration::from_secs(90))
            .run()
            .await;

        assert!(outcome.snapshots.len() > 10);
        for window in outcome.snapshots.windows(2) {
            assert!(window[1].elapsed_seconds >= window[0].elapsed_seconds);
            assert!(window[1].distance_meters >= window[0].distance_meters);
            assert!(window[1].steps >= window[0].steps);
            assert!(window[1].calories >= window[0].calories);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_excludes_time_and_movement() {
        // 40 s active, 30 s paused, 60 s active; the trace is 100 s long so
        // it finishes emitting during the final active stretch.
        let outcome = ScenarioBuilder::new(11)
            .with_duration(Duration::from_secs(100))
            .then_wait(Duration::from_secs(40))
            .then_pause()
            .then_wait(Duration::from_secs(30))
            .then_resume()
            .then_wait(Duration::from_secs(65))
            .run()
            .await;

        // Paused wall time never reaches the elapsed counter.
        assert!(outcome.result.elapsed_seconds < 110);
        assert!(outcome.result.elapsed_seconds >= 100);

        let paused: Vec<_> = outcome
            .snapshots
            .iter()
            .filter(|s| s.phase == SessionPhase::Paused)
            .collect();
        assert!(!paused.is_empty());
        let first = paused[0];
        for snap in &paused {
            assert_eq!(snap.elapsed_seconds, first.elapsed_seconds);
            assert_eq!(snap.distance_meters, first.distance_meters);
            assert_eq!(snap.steps, first.steps);
        }

        // The simulated hardware holds its position across the pause, so the
        // engine sees the whole trace; at most a fix buffered right at the
        // pause boundary is discarded.
        assert!(outcome.result.distance_meters > 0.0);
        assert!(outcome.result.distance_meters <= outcome.trace.clean_distance_m + 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_garbage_only_trace_credits_nothing() {
        let outcome = ScenarioBuilder::new(5)
            .with_duration(Duration::from_secs(60))
            .with_config(SimConfig {
                bad_fix_probability: 1.0,
                ..SimConfig::default()
            })
            .run()
            .await;

        assert_eq!(outcome.result.distance_meters, 0.0);
        assert!(outcome.result.path.is_empty());
        // Time and steps still accrue; only location is gated.
        assert!(outcome.result.elapsed_seconds >= 59);
        assert_eq!(outcome.result.steps, outcome.expected_steps);
    }
}
