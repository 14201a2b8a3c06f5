//! Replay of recorded GPX tracks as a live location stream.
//!
//! Lets the engine run against real recorded data without GPS hardware: each
//! track point becomes a fix, speed over ground is derived from the distance
//! and time delta to the previous point, and emission is paced by the
//! original timestamps (optionally accelerated).

use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use geo::{Distance as _, Haversine, Point};
use time::OffsetDateTime;
use tokio::sync::mpsc;

use crate::models::LocationFix;
use crate::sources::{LocationSource, StepSource, Subscription};

/// Accuracy reported for replayed fixes; GPX carries no accuracy estimate,
/// so replay claims a clean fix that passes the gate.
const REPLAY_ACCURACY_M: f64 = 5.0;

/// Gap assumed between points that carry no timestamp.
const DEFAULT_POINT_GAP: Duration = Duration::from_secs(1);

/// A [`LocationSource`] that replays a GPX track.
pub struct GpxReplaySource {
    /// Emission delay before each fix, already divided by the speedup.
    schedule: Vec<(Duration, LocationFix)>,
    total: Duration,
}

impl GpxReplaySource {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let gpx = gpx::read(BufReader::new(file))?;
        Ok(Self::from_gpx(&gpx, 1.0))
    }

    pub fn from_reader(reader: impl std::io::Read, speedup: f64) -> anyhow::Result<Self> {
        let gpx = gpx::read(BufReader::new(reader))?;
        Ok(Self::from_gpx(&gpx, speedup))
    }

    /// Replays the track `speedup` times faster than it was recorded.
    pub fn with_speedup(path: impl AsRef<Path>, speedup: f64) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let gpx = gpx::read(BufReader::new(file))?;
        Ok(Self::from_gpx(&gpx, speedup))
    }

    fn from_gpx(gpx: &gpx::Gpx, speedup: f64) -> Self {
        let mut schedule = Vec::new();
        let mut total = Duration::ZERO;
        let mut prev: Option<(Point<f64>, Option<OffsetDateTime>)> = None;

        for track in &gpx.tracks {
            for segment in &track.segments {
                for wpt in &segment.points {
                    let here = wpt.point();
                    let at: Option<OffsetDateTime> = wpt.time.map(Into::into);

                    let (gap, speed_mps) = match prev {
                        None => (Duration::ZERO, None),
                        Some((there, before)) => {
                            let meters = Haversine.distance(there, here);
                            let gap = match (before, at) {
                                (Some(t0), Some(t1)) if t1 > t0 => {
                                    Duration::try_from(t1 - t0).unwrap_or(DEFAULT_POINT_GAP)
                                }
                                _ => DEFAULT_POINT_GAP,
                            };
                            let speed = meters / gap.as_secs_f64();
                            (gap, Some(speed))
                        }
                    };

                    let mut fix =
                        LocationFix::new(here.y(), here.x(), REPLAY_ACCURACY_M);
                    if let Some(speed) = speed_mps {
                        fix = fix.with_speed(speed);
                    }

                    total += gap;
                    schedule.push((gap.div_f64(speedup.max(1e-9)), fix));
                    prev = Some((here, at));
                }
            }
        }

        Self { schedule, total }
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    pub fn fix_count(&self) -> usize {
        self.schedule.len()
    }

    /// Recorded (unaccelerated) duration of the track.
    pub fn recorded_duration(&self) -> Duration {
        self.total
    }

    /// Wall-clock time the replay will take to emit every fix.
    pub fn replay_duration(&self) -> Duration {
        self.schedule.iter().map(|(gap, _)| *gap).sum()
    }

    pub fn fixes(&self) -> impl Iterator<Item = &LocationFix> {
        self.schedule.iter().map(|(_, fix)| fix)
    }
}

impl LocationSource for GpxReplaySource {
    fn subscribe(&self, sink: mpsc::Sender<LocationFix>) -> Subscription {
        let schedule = self.schedule.clone();
        let task = tokio::spawn(async move {
            for (gap, fix) in schedule {
                tokio::time::sleep(gap).await;
                if sink.send(fix).await.is_err() {
                    return;
                }
            }
            tracing::debug!("Replay complete");
        });
        Subscription::from_task(task.abort_handle())
    }
}

/// Synthetic hardware step counter running at a fixed cadence. Pairs with
/// [`GpxReplaySource`] for demos on machines without a step sensor.
pub struct CadenceStepSource {
    pub steps_per_minute: f64,
    /// Raw counter value at subscription, as if the device had been counting
    /// since boot.
    pub counter_offset: u64,
    pub report_interval: Duration,
}

impl Default for CadenceStepSource {
    fn default() -> Self {
        Self {
            steps_per_minute: 160.0,
            counter_offset: 48_213,
            report_interval: Duration::from_secs(2),
        }
    }
}

impl StepSource for CadenceStepSource {
    fn subscribe(&self, sink: mpsc::Sender<u64>) -> Subscription {
        let per_second = self.steps_per_minute / 60.0;
        let offset = self.counter_offset;
        let interval = self.report_interval;
        let task = tokio::spawn(async move {
            let mut elapsed = Duration::ZERO;
            loop {
                tokio::time::sleep(interval).await;
                elapsed += interval;
                let raw = offset + (per_second * elapsed.as_secs_f64()) as u64;
                if sink.send(raw).await.is_err() {
                    return;
                }
            }
        });
        Subscription::from_task(task.abort_handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Morning loop</name>
    <trkseg>
      <trkpt lat="40.0000" lon="-105.3000"><time>2024-05-01T06:00:00Z</time></trkpt>
      <trkpt lat="40.0010" lon="-105.3000"><time>2024-05-01T06:00:30Z</time></trkpt>
      <trkpt lat="40.0020" lon="-105.3000"><time>2024-05-01T06:01:00Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_replay_derives_speed_from_timestamps() {
        let source = GpxReplaySource::from_reader(SAMPLE_GPX.as_bytes(), 1.0).unwrap();
        assert_eq!(source.fix_count(), 3);
        assert_eq!(source.recorded_duration(), Duration::from_secs(60));

        let fixes: Vec<_> = source.fixes().collect();
        assert!(fixes[0].speed_mps.is_none());
        // ~111 m in 30 s -> ~3.7 m/s
        let speed = fixes[1].speed_mps.unwrap();
        assert!((speed - 3.7).abs() < 0.1, "speed was {speed}");
    }

    #[test]
    fn test_speedup_compresses_schedule() {
        let source = GpxReplaySource::from_reader(SAMPLE_GPX.as_bytes(), 10.0).unwrap();
        assert_eq!(source.recorded_duration(), Duration::from_secs(60));
        assert_eq!(source.replay_duration(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_emits_all_fixes_in_order() {
        let source = GpxReplaySource::from_reader(SAMPLE_GPX.as_bytes(), 1.0).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let _sub = source.subscribe(tx);

        let mut fixes = Vec::new();
        while let Some(fix) = rx.recv().await {
            fixes.push(fix);
        }
        assert_eq!(fixes.len(), 3);
        assert!(fixes[0].latitude < fixes[2].latitude);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cadence_counter_is_cumulative() {
        let source = CadenceStepSource {
            steps_per_minute: 120.0,
            counter_offset: 1000,
            report_interval: Duration::from_secs(1),
        };
        let (tx, mut rx) = mpsc::channel(8);
        let _sub = source.subscribe(tx);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first, 1002);
        assert_eq!(second, 1004);
    }
}
