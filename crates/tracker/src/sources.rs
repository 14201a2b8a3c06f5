//! Adapter contracts for the platform sensor streams.
//!
//! A source is subscribed and unsubscribed as a unit: `subscribe` hands the
//! producer an mpsc sender and returns a [`Subscription`] guard; dropping the
//! guard tears the producer down. The engine relies on this to close the
//! ingestion window synchronously on pause and stop: events buffered in a
//! dropped channel are never observed again.

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::models::LocationFix;

/// Drop-guard for an active sensor subscription.
pub struct Subscription {
    cancel: Option<CancelKind>,
}

enum CancelKind {
    Abort(AbortHandle),
    Func(Box<dyn FnOnce() + Send>),
}

impl Subscription {
    /// A subscription with nothing to tear down (e.g. a source that never
    /// produces events).
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// Cancels a producer task when the subscription is dropped.
    pub fn from_task(handle: AbortHandle) -> Self {
        Self {
            cancel: Some(CancelKind::Abort(handle)),
        }
    }

    /// Runs an arbitrary teardown closure when the subscription is dropped.
    pub fn on_drop(f: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(CancelKind::Func(Box::new(f))),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        match self.cancel.take() {
            Some(CancelKind::Abort(handle)) => handle.abort(),
            Some(CancelKind::Func(f)) => f(),
            None => {}
        }
    }
}

/// Stream of location fixes (the platform GPS adapter).
pub trait LocationSource: Send + Sync {
    fn subscribe(&self, sink: mpsc::Sender<LocationFix>) -> Subscription;
}

/// Stream of cumulative hardware step-counter readings.
pub trait StepSource: Send + Sync {
    fn subscribe(&self, sink: mpsc::Sender<u64>) -> Subscription;
}

/// Step source for devices without a step counter: never produces an event,
/// so the session's step total stays at zero. Not an error.
pub struct NullStepSource;

impl StepSource for NullStepSource {
    fn subscribe(&self, _sink: mpsc::Sender<u64>) -> Subscription {
        Subscription::inert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_subscription_runs_teardown_on_drop() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let sub = Subscription::on_drop(move || flag.store(true, Ordering::SeqCst));
        assert!(!cancelled.load(Ordering::SeqCst));
        drop(sub);
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_subscription_aborts_producer_task() {
        let (tx, mut rx) = mpsc::channel::<u64>(4);
        let task = tokio::spawn(async move {
            let mut n = 0;
            loop {
                if tx.send(n).await.is_err() {
                    break;
                }
                n += 1;
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
        });
        let sub = Subscription::from_task(task.abort_handle());

        assert!(rx.recv().await.is_some());
        drop(sub);
        task.await.unwrap_err(); // aborted

        // Drain whatever was buffered; the channel then closes for good.
        while rx.try_recv().is_ok() {}
        assert!(rx.recv().await.is_none());
    }
}
