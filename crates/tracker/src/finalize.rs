//! Finalization collaborators: the optional path-snapshot renderer and the
//! sink that receives the finished [`RunResult`].
//!
//! Both are best-effort from the engine's point of view: a slow or failing
//! snapshot provider is bounded by a timeout, and a failing sink is logged
//! without undoing the stop.

use std::path::PathBuf;

use async_trait::async_trait;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

use crate::models::{GeoPoint, RunResult};

/// Renders a static image of the recorded path (e.g. a map screenshot).
///
/// The engine awaits this with a bounded timeout at stop; on timeout or
/// error the result is delivered without an image reference.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn render(&self, path: &[GeoPoint]) -> anyhow::Result<PathBuf>;
}

/// Receives the finalized result for persistence. The engine neither knows
/// nor cares how or where it is stored.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn deliver(&self, result: &RunResult) -> anyhow::Result<()>;
}

/// Sink that drops the result. Useful for tests and dry runs.
pub struct DiscardSink;

#[async_trait]
impl ResultSink for DiscardSink {
    async fn deliver(&self, _result: &RunResult) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Persists each result as a pretty-printed JSON summary in a directory.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn deliver(&self, result: &RunResult) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("run-{}.json", result.id));
        let body = serde_json::to_vec_pretty(result)?;
        tokio::fs::write(&path, body).await?;
        tracing::info!("Saved run summary to {}", path.display());
        Ok(())
    }
}

/// Exports the recorded path of each result as a GPX track.
pub struct GpxFileSink {
    dir: PathBuf,
}

impl GpxFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ResultSink for GpxFileSink {
    async fn deliver(&self, result: &RunResult) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("run-{}.gpx", result.id));

        let gpx = path_to_gpx(result);
        let mut buf = Vec::new();
        gpx::write(&gpx, &mut buf)?;
        tokio::fs::write(&path, buf).await?;
        tracing::info!("Exported track to {}", path.display());
        Ok(())
    }
}

fn path_to_gpx(result: &RunResult) -> Gpx {
    let mut segment = TrackSegment::new();
    segment.points = result
        .path
        .iter()
        .map(|p| Waypoint::new((*p).into()))
        .collect();

    let mut track = Track::new();
    track.name = Some(format!("Run {}", result.started_at.date()));
    track.segments.push(segment);

    Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("run-tracker".to_string()),
        tracks: vec![track],
        ..Default::default()
    }
}

/// Fans a result out to several sinks; each failure is logged and the rest
/// still run.
pub struct MultiSink {
    sinks: Vec<Box<dyn ResultSink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Box<dyn ResultSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl ResultSink for MultiSink {
    async fn deliver(&self, result: &RunResult) -> anyhow::Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(result).await {
                tracing::error!("Result sink failed: {e:?}");
            }
        }
        Ok(())
    }
}
