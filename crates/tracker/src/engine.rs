//! The tracking engine: one supervised session task per run.
//!
//! [`TrackingEngine`] owns at most one live session. Each session is a single
//! tokio task that is the sole owner of its [`RunState`]; location and step
//! events reach it over mpsc channels, commands over a command channel, and
//! the observable state leaves it through a watch channel. Serializing all
//! mutation through one consumer is what keeps distance/steps/path updates
//! from racing the tick loop.
//!
//! Pause tears the sensor subscriptions down (it does not merely ignore
//! events): the subscription guards and their channels are dropped, so a fix
//! in flight at the pause boundary lands in a closed channel and is never
//! observed. Resume re-subscribes on fresh channels; the step baseline and
//! last accepted location survive, so accounting continues without a jump.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::TrackerConfig;
use crate::errors::EngineError;
use crate::finalize::{ResultSink, SnapshotProvider};
use crate::models::{LocationFix, RunResult, RunSnapshot, SessionPhase, UserProfile};
use crate::session::RunState;
use crate::sources::{LocationSource, StepSource, Subscription};
use crate::status::{StatusNotifier, status_line};

enum Command {
    Pause,
    Resume,
    Stop(oneshot::Sender<RunResult>),
}

struct ActiveSession {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

/// Supervises the single live tracking session and exposes the four
/// commands plus the observable state stream.
pub struct TrackingEngine {
    config: TrackerConfig,
    location: Arc<dyn LocationSource>,
    steps: Arc<dyn StepSource>,
    sink: Arc<dyn ResultSink>,
    snapshotter: Option<Arc<dyn SnapshotProvider>>,
    notifier: Option<Arc<dyn StatusNotifier>>,
    state_tx: Arc<watch::Sender<RunSnapshot>>,
    active: Mutex<Option<ActiveSession>>,
}

impl TrackingEngine {
    pub fn new(
        location: Arc<dyn LocationSource>,
        steps: Arc<dyn StepSource>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        let (state_tx, _) = watch::channel(RunSnapshot::idle());
        Self {
            config: TrackerConfig::default(),
            location,
            steps,
            sink,
            snapshotter: None,
            notifier: None,
            state_tx: Arc::new(state_tx),
            active: Mutex::new(None),
        }
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_snapshot_provider(mut self, provider: Arc<dyn SnapshotProvider>) -> Self {
        self.snapshotter = Some(provider);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn StatusNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Subscribes to the observable session state. The receiver sees the
    /// latest snapshot immediately and every publication from then on.
    pub fn watch(&self) -> watch::Receiver<RunSnapshot> {
        self.state_tx.subscribe()
    }

    /// Creates the session and enters `Running`.
    ///
    /// Starting while a session is live is not a supported transition and
    /// returns [`EngineError::SessionActive`]; the previous session must be
    /// stopped first.
    pub async fn start(&self, profile: UserProfile) -> Result<(), EngineError> {
        let mut active = self.active.lock().await;
        if let Some(session) = active.as_ref()
            && !session.task.is_finished()
        {
            return Err(EngineError::SessionActive);
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let worker = SessionWorker {
            config: self.config.clone(),
            location: self.location.clone(),
            steps: self.steps.clone(),
            sink: self.sink.clone(),
            snapshotter: self.snapshotter.clone(),
            notifier: self.notifier.clone(),
            state_tx: self.state_tx.clone(),
        };
        let state = RunState::new(profile);
        tracing::info!("Starting tracking session {}", state.id());
        let task = tokio::spawn(worker.run(state, cmd_rx));
        *active = Some(ActiveSession {
            commands: cmd_tx,
            task,
        });
        Ok(())
    }

    /// Suspends accumulation and sensor ingestion. No-op while paused.
    pub async fn pause(&self) -> Result<(), EngineError> {
        self.send(Command::Pause).await
    }

    /// Resumes a paused session. No-op while running.
    pub async fn resume(&self) -> Result<(), EngineError> {
        self.send(Command::Resume).await
    }

    /// Stops the session and returns its frozen summary.
    ///
    /// By the time this returns, all subscriptions are torn down, the session
    /// task has exited, and the result has been offered to the sink.
    pub async fn stop(&self) -> Result<RunResult, EngineError> {
        let mut active = self.active.lock().await;
        let session = active.take().ok_or(EngineError::NoSession)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        session
            .commands
            .send(Command::Stop(reply_tx))
            .await
            .map_err(|_| EngineError::SessionLost)?;
        let result = reply_rx.await.map_err(|_| EngineError::SessionLost)?;

        // The task ends right after replying; join so no session activity
        // outlives this call.
        let _ = session.task.await;
        Ok(result)
    }

    async fn send(&self, cmd: Command) -> Result<(), EngineError> {
        let active = self.active.lock().await;
        let session = active.as_ref().ok_or(EngineError::NoSession)?;
        session
            .commands
            .send(cmd)
            .await
            .map_err(|_| EngineError::SessionLost)
    }
}

/// Everything the session task needs, detached from the engine handle.
struct SessionWorker {
    config: TrackerConfig,
    location: Arc<dyn LocationSource>,
    steps: Arc<dyn StepSource>,
    sink: Arc<dyn ResultSink>,
    snapshotter: Option<Arc<dyn SnapshotProvider>>,
    notifier: Option<Arc<dyn StatusNotifier>>,
    state_tx: Arc<watch::Sender<RunSnapshot>>,
}

/// Live sensor subscriptions plus their consuming channel ends. Dropping
/// this tears both producers down and discards anything still buffered.
struct Ingest {
    location_rx: mpsc::Receiver<LocationFix>,
    steps_rx: mpsc::Receiver<u64>,
    _location_sub: Subscription,
    _steps_sub: Subscription,
}

enum Event {
    Tick,
    Fix(LocationFix),
    Steps(u64),
    Command(Option<Command>),
}

impl SessionWorker {
    fn subscribe(&self) -> Ingest {
        let (loc_tx, location_rx) = mpsc::channel(self.config.channel_capacity);
        let (step_tx, steps_rx) = mpsc::channel(self.config.channel_capacity);
        Ingest {
            _location_sub: self.location.subscribe(loc_tx),
            _steps_sub: self.steps.subscribe(step_tx),
            location_rx,
            steps_rx,
        }
    }

    async fn run(self, mut state: RunState, mut commands: mpsc::Receiver<Command>) {
        let mut ingest = Some(self.subscribe());
        let mut ticker = self.ticker(self.config.tick_interval);
        self.publish(&state);

        loop {
            let running = state.phase() == SessionPhase::Running;

            let event = {
                let (loc_rx, step_rx) = match ingest.as_mut() {
                    Some(Ingest {
                        location_rx,
                        steps_rx,
                        ..
                    }) => (Some(location_rx), Some(steps_rx)),
                    None => (None, None),
                };

                tokio::select! {
                    _ = ticker.tick() => Event::Tick,
                    Some(fix) = recv_or_pending(loc_rx), if running => Event::Fix(fix),
                    Some(raw) = recv_or_pending(step_rx), if running => Event::Steps(raw),
                    cmd = commands.recv() => Event::Command(cmd),
                }
            };

            match event {
                Event::Tick => {
                    if running {
                        state.tick();
                        let snap = self.publish(&state);
                        self.notify(&snap);
                    }
                }
                Event::Fix(fix) => {
                    if state.ingest_fix(&fix) {
                        self.publish(&state);
                    } else {
                        tracing::debug!(
                            "Dropped fix with {:.0} m accuracy",
                            fix.horizontal_accuracy_m
                        );
                    }
                }
                Event::Steps(raw) => {
                    state.ingest_steps(raw);
                    self.publish(&state);
                }
                Event::Command(Some(Command::Pause)) => {
                    if state.phase() == SessionPhase::Running {
                        ingest = None;
                        ticker = self.ticker(self.config.pause_poll_interval);
                        state.set_phase(SessionPhase::Paused);
                        let snap = self.publish(&state);
                        self.notify(&snap);
                        tracing::info!("Session {} paused", state.id());
                    }
                }
                Event::Command(Some(Command::Resume)) => {
                    if state.phase() == SessionPhase::Paused {
                        ingest = Some(self.subscribe());
                        ticker = self.ticker(self.config.tick_interval);
                        state.set_phase(SessionPhase::Running);
                        self.publish(&state);
                        tracing::info!("Session {} resumed", state.id());
                    }
                }
                Event::Command(Some(Command::Stop(reply))) => {
                    drop(ingest);
                    let result = self.finalize(state).await;
                    let _ = reply.send(result);
                    return;
                }
                Event::Command(None) => {
                    // Engine handle dropped with the session still live.
                    drop(ingest);
                    tracing::warn!("Engine dropped mid-session; finalizing without a caller");
                    let _ = self.finalize(state).await;
                    return;
                }
            }
        }
    }

    /// A tick stream that holds its schedule while other events arrive; a
    /// busy fix stream must not starve the elapsed-time clock.
    fn ticker(&self, period: std::time::Duration) -> tokio::time::Interval {
        tokio::time::interval_at(tokio::time::Instant::now() + period, period)
    }

    async fn finalize(&self, mut state: RunState) -> RunResult {
        state.set_phase(SessionPhase::Stopped);
        self.publish(&state);

        let image = match &self.snapshotter {
            Some(provider) => {
                match tokio::time::timeout(
                    self.config.snapshot_timeout,
                    provider.render(state.path()),
                )
                .await
                {
                    Ok(Ok(path)) => Some(path),
                    Ok(Err(e)) => {
                        tracing::warn!("Path snapshot failed: {e:?}");
                        None
                    }
                    Err(_) => {
                        tracing::warn!("Path snapshot timed out");
                        None
                    }
                }
            }
            None => None,
        };

        let result = state.finalize(image);
        tracing::info!(
            "Session {} finished: {:.2} km, {} s, {} kcal, {} steps",
            result.id,
            result.distance_meters / 1000.0,
            result.elapsed_seconds,
            result.calories,
            result.steps,
        );
        if let Err(e) = self.sink.deliver(&result).await {
            tracing::error!("Failed to deliver run result: {e:?}");
        }
        result
    }

    fn publish(&self, state: &RunState) -> RunSnapshot {
        let snap = state.snapshot();
        self.state_tx.send_replace(snap.clone());
        snap
    }

    fn notify(&self, snap: &RunSnapshot) {
        if let Some(notifier) = &self.notifier {
            notifier.update(&status_line(snap));
        }
    }
}

async fn recv_or_pending<T>(rx: Option<&mut mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::DiscardSink;
    use crate::models::GeoPoint;
    use crate::sources::NullStepSource;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// Source whose producer is the test itself. Mirrors the unsubscribe
    /// contract: dropping the subscription removes the sender, so pushes
    /// fail while the engine is paused or stopped.
    struct ManualSource<T> {
        tx: Arc<StdMutex<Option<mpsc::Sender<T>>>>,
    }

    impl<T> Default for ManualSource<T> {
        fn default() -> Self {
            Self {
                tx: Arc::new(StdMutex::new(None)),
            }
        }
    }

    impl<T: Send + 'static> ManualSource<T> {
        fn subscribe_inner(&self, sink: mpsc::Sender<T>) -> Subscription {
            *self.tx.lock().unwrap() = Some(sink);
            let slot = self.tx.clone();
            Subscription::on_drop(move || {
                slot.lock().unwrap().take();
            })
        }

        async fn push(&self, value: T) -> bool {
            let tx = self.tx.lock().unwrap().clone();
            match tx {
                Some(tx) => tx.send(value).await.is_ok(),
                None => false,
            }
        }
    }

    impl LocationSource for ManualSource<LocationFix> {
        fn subscribe(&self, sink: mpsc::Sender<LocationFix>) -> Subscription {
            self.subscribe_inner(sink)
        }
    }

    impl StepSource for ManualSource<u64> {
        fn subscribe(&self, sink: mpsc::Sender<u64>) -> Subscription {
            self.subscribe_inner(sink)
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        results: StdMutex<Vec<RunResult>>,
    }

    #[async_trait]
    impl ResultSink for CollectingSink {
        async fn deliver(&self, result: &RunResult) -> anyhow::Result<()> {
            self.results.lock().unwrap().push(result.clone());
            Ok(())
        }
    }

    struct SlowSnapshotter {
        delay: Duration,
    }

    #[async_trait]
    impl SnapshotProvider for SlowSnapshotter {
        async fn render(&self, _path: &[GeoPoint]) -> anyhow::Result<PathBuf> {
            tokio::time::sleep(self.delay).await;
            Ok(PathBuf::from("/tmp/snapshot.png"))
        }
    }

    fn profile() -> UserProfile {
        UserProfile::new(70.0, 178.0, 30)
    }

    struct Harness {
        engine: TrackingEngine,
        location: Arc<ManualSource<LocationFix>>,
        steps: Arc<ManualSource<u64>>,
        sink: Arc<CollectingSink>,
    }

    fn harness() -> Harness {
        let location = Arc::new(ManualSource::<LocationFix>::default());
        let steps = Arc::new(ManualSource::<u64>::default());
        let sink = Arc::new(CollectingSink::default());
        let engine = TrackingEngine::new(location.clone(), steps.clone(), sink.clone());
        Harness {
            engine,
            location,
            steps,
            sink,
        }
    }

    /// Lets the session task run and subscribe under the paused clock.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn fix_at_kmh(kmh: f64) -> LocationFix {
        LocationFix::new(40.0, -105.3, 5.0).with_speed(kmh / 3.6)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_active_is_rejected() {
        let h = harness();
        h.engine.start(profile()).await.unwrap();
        settle().await;
        assert!(matches!(
            h.engine.start(profile()).await,
            Err(EngineError::SessionActive)
        ));
        h.engine.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_without_session_error() {
        let h = harness();
        assert!(matches!(h.engine.pause().await, Err(EngineError::NoSession)));
        assert!(matches!(
            h.engine.resume().await,
            Err(EngineError::NoSession)
        ));
        assert!(matches!(h.engine.stop().await, Err(EngineError::NoSession)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_accumulate_time_and_calories() {
        let h = harness();
        h.engine.start(profile()).await.unwrap();
        settle().await;

        assert!(h.location.push(fix_at_kmh(6.0)).await);
        tokio::time::sleep(Duration::from_secs(61)).await;

        let snap = h.engine.watch().borrow().clone();
        assert!(snap.elapsed_seconds >= 60);
        // ~5.145 kcal over the first 60 active seconds
        assert!(snap.calories > 5.0);

        let result = h.engine.stop().await.unwrap();
        // Frozen summary rounds the precise accumulator; a tick may land
        // between the snapshot read and the stop.
        assert!((result.calories as f64 - snap.calories).abs() < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_accumulation_and_tears_down_sources() {
        let h = harness();
        h.engine.start(profile()).await.unwrap();
        settle().await;

        assert!(h.location.push(fix_at_kmh(6.0)).await);
        tokio::time::sleep(Duration::from_secs(10)).await;

        h.engine.pause().await.unwrap();
        settle().await;
        let frozen = h.engine.watch().borrow().clone();
        assert_eq!(frozen.phase, SessionPhase::Paused);

        // Subscriptions are gone, not merely ignored.
        assert!(!h.location.push(fix_at_kmh(12.0)).await);
        assert!(!h.steps.push(9000).await);

        // Five ticks worth of wall time changes nothing.
        tokio::time::sleep(Duration::from_secs(5)).await;
        let still = h.engine.watch().borrow().clone();
        assert_eq!(still.elapsed_seconds, frozen.elapsed_seconds);
        assert_eq!(still.calories, frozen.calories);
        assert_eq!(still.distance_meters, frozen.distance_meters);
        assert_eq!(still.steps, frozen.steps);

        // Resume continues from the frozen values, not from zero.
        h.engine.resume().await.unwrap();
        settle().await;
        assert!(h.location.push(fix_at_kmh(6.0)).await);
        tokio::time::sleep(Duration::from_secs(10)).await;
        let resumed = h.engine.watch().borrow().clone();
        assert!(resumed.elapsed_seconds >= frozen.elapsed_seconds + 9);
        assert!(resumed.calories > frozen.calories);

        h.engine.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_pause_and_resume_are_noops() {
        let h = harness();
        h.engine.start(profile()).await.unwrap();
        settle().await;

        h.engine.pause().await.unwrap();
        h.engine.pause().await.unwrap();
        settle().await;
        assert_eq!(h.engine.watch().borrow().phase, SessionPhase::Paused);

        h.engine.resume().await.unwrap();
        h.engine.resume().await.unwrap();
        settle().await;
        assert_eq!(h.engine.watch().borrow().phase, SessionPhase::Running);

        h.engine.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_baseline_survives_pause_resume() {
        let h = harness();
        h.engine.start(profile()).await.unwrap();
        settle().await;

        assert!(h.steps.push(15_000).await);
        assert!(h.steps.push(15_010).await);
        settle().await;
        assert_eq!(h.engine.watch().borrow().steps, 10);

        h.engine.pause().await.unwrap();
        settle().await;
        h.engine.resume().await.unwrap();
        settle().await;

        // Same hardware counter, same baseline: cumulative across the pause.
        assert!(h.steps.push(15_025).await);
        settle().await;
        assert_eq!(h.engine.watch().borrow().steps, 25);

        h.engine.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_delivers_to_sink_and_is_final() {
        let h = harness();
        h.engine.start(profile()).await.unwrap();
        settle().await;

        assert!(h.location.push(fix_at_kmh(6.0)).await);
        tokio::time::sleep(Duration::from_secs(5)).await;

        let result = h.engine.stop().await.unwrap();
        assert_eq!(h.engine.watch().borrow().phase, SessionPhase::Stopped);

        let delivered = h.sink.results.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].id, result.id);

        drop(delivered);
        assert!(matches!(h.engine.stop().await, Err(EngineError::NoSession)));

        // A stopped engine accepts a fresh session.
        h.engine.start(profile()).await.unwrap();
        h.engine.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_timeout_degrades_gracefully() {
        let location = Arc::new(ManualSource::<LocationFix>::default());
        let engine = TrackingEngine::new(
            location.clone(),
            Arc::new(NullStepSource),
            Arc::new(DiscardSink),
        )
        .with_snapshot_provider(Arc::new(SlowSnapshotter {
            delay: Duration::from_secs(30),
        }));

        engine.start(profile()).await.unwrap();
        settle().await;
        let result = engine.stop().await.unwrap();
        assert!(result.snapshot_image.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_within_budget_is_attached() {
        let engine = TrackingEngine::new(
            Arc::new(ManualSource::<LocationFix>::default()),
            Arc::new(NullStepSource),
            Arc::new(DiscardSink),
        )
        .with_snapshot_provider(Arc::new(SlowSnapshotter {
            delay: Duration::from_millis(100),
        }));

        engine.start(profile()).await.unwrap();
        settle().await;
        let result = engine.stop().await.unwrap();
        assert_eq!(result.snapshot_image, Some(PathBuf::from("/tmp/snapshot.png")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_step_hardware_keeps_session_alive() {
        let location = Arc::new(ManualSource::<LocationFix>::default());
        let engine = TrackingEngine::new(
            location.clone(),
            Arc::new(NullStepSource),
            Arc::new(DiscardSink),
        );

        engine.start(profile()).await.unwrap();
        settle().await;
        assert!(location.push(fix_at_kmh(6.0)).await);
        tokio::time::sleep(Duration::from_secs(10)).await;

        let result = engine.stop().await.unwrap();
        assert_eq!(result.steps, 0);
        assert!(result.elapsed_seconds >= 9);
        assert!(result.calories > 0);
    }
}
