//! Runs a full simulated session against the real engine.
//!
//! Generates a seeded sensor trace, replays it at an accelerated clock, and
//! compares the engine's result to the trace's ground truth.
//!
//! ```text
//! SEED=42 DURATION_SECS=600 SPEEDUP=60 cargo run -p test-data --bin simulate
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use test_data::SimConfig;
use test_data::generators::{FixGenerator, StepTraceGenerator};
use test_data::profiles::{AthleteProfile, RunnerProfile};
use test_data::sources::{SimLocationSource, SimStepSource};
use tracker::config::TrackerConfig;
use tracker::engine::TrackingEngine;
use tracker::finalize::DiscardSink;
use tracker::models::UserProfile;
use tracker::status::LogStatusNotifier;
use tracing_subscriber::EnvFilter;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let seed: u64 = env_or("SEED", 42);
    let duration = Duration::from_secs(env_or("DURATION_SECS", 600));
    let speedup: f64 = env_or("SPEEDUP", 60.0);

    let config = SimConfig::default();
    let mut rng = StdRng::seed_from_u64(seed);

    let athlete = RunnerProfile::default();
    let trace = FixGenerator::new(seed as u32)
        .with_config(config.clone())
        .generate(&athlete, duration, &mut rng);
    let readings = StepTraceGenerator::new(athlete.cadence_spm(), config.step_counter_offset)
        .generate(duration, &mut rng);
    let expected_steps = StepTraceGenerator::expected_steps(&readings);

    tracing::info!("Trace for seed {seed}: {} fixes ({} gate-failing), {:.1} m clean distance",
        trace.fixes.len(),
        trace.rejected_fixes,
        trace.clean_distance_m,
    );

    // Compress the tick clock by the same factor as the sources so elapsed
    // seconds track the simulated run rather than the wall time.
    let engine = TrackingEngine::new(
        Arc::new(SimLocationSource::new(&trace).with_speedup(speedup)),
        Arc::new(SimStepSource::new(readings).with_speedup(speedup)),
        Arc::new(DiscardSink),
    )
    .with_config(TrackerConfig {
        tick_interval: Duration::from_secs(1).div_f64(speedup),
        pause_poll_interval: Duration::from_millis(500).div_f64(speedup),
        ..TrackerConfig::default()
    })
    .with_notifier(Arc::new(LogStatusNotifier));

    engine.start(UserProfile::new(70.0, 178.0, 30)).await?;
    tokio::time::sleep(duration.div_f64(speedup) + Duration::from_millis(200)).await;
    let result = engine.stop().await?;

    tracing::info!("Session {} finished", result.id);
    tracing::info!("  Distance: {:.1} m (trace ground truth {:.1} m)",
        result.distance_meters,
        trace.clean_distance_m,
    );
    tracing::info!("  Elapsed: {} s", result.elapsed_seconds);
    tracing::info!("  Calories: {} kcal", result.calories);
    tracing::info!("  Steps: {} (expected {expected_steps})", result.steps);
    tracing::info!("  Path points: {}", result.path.len());

    Ok(())
}
