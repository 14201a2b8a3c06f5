//! Replay demo: runs a full tracking session over a recorded GPX file.
//!
//! ```text
//! GPX_FILE=track.gpx SPEEDUP=60 cargo run -p tracker
//! ```

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tracker::config::TrackerConfig;
use tracker::engine::TrackingEngine;
use tracker::finalize::{GpxFileSink, JsonFileSink, MultiSink};
use tracker::models::UserProfile;
use tracker::replay::{CadenceStepSource, GpxReplaySource};
use tracker::status::LogStatusNotifier;

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let gpx_file = env::var("GPX_FILE")
        .ok()
        .or_else(|| env::args().nth(1))
        .ok_or_else(|| anyhow::anyhow!("pass a GPX file as GPX_FILE or first argument"))?;

    let speedup = env::var("SPEEDUP")
        .unwrap_or_else(|_| "60".to_string())
        .parse::<f64>()
        .unwrap_or(60.0);

    let weight_kg = env::var("WEIGHT_KG")
        .unwrap_or_else(|_| "70".to_string())
        .parse::<f64>()
        .unwrap_or(70.0);

    let output_dir = env::var("OUTPUT_DIR").unwrap_or_else(|_| "./runs".to_string());

    let replay = GpxReplaySource::with_speedup(&gpx_file, speedup)?;
    if replay.is_empty() {
        anyhow::bail!("no track points in {gpx_file}");
    }
    tracing::info!(
        "Replaying {} fixes ({:?} recorded) at {speedup}x",
        replay.fix_count(),
        replay.recorded_duration(),
    );

    // Compress the tick clock by the same factor so elapsed seconds track
    // the recording rather than the replay wall time.
    let config = TrackerConfig {
        tick_interval: Duration::from_secs(1).div_f64(speedup),
        pause_poll_interval: Duration::from_millis(500).div_f64(speedup),
        ..TrackerConfig::default()
    };

    let wait_for = replay.replay_duration() + config.tick_interval * 2;

    let sink = MultiSink::new(vec![
        Box::new(JsonFileSink::new(&output_dir)),
        Box::new(GpxFileSink::new(&output_dir)),
    ]);

    let engine = TrackingEngine::new(
        Arc::new(replay),
        Arc::new(CadenceStepSource::default()),
        Arc::new(sink),
    )
    .with_config(config)
    .with_notifier(Arc::new(LogStatusNotifier));

    let profile = UserProfile::new(weight_kg, 175.0, 30);
    engine.start(profile).await?;

    tokio::time::sleep(wait_for).await;

    let result = engine.stop().await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
