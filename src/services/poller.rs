// src/services/poller.rs
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing;

use crate::services::booking_tracker::BookingTracker;

/// How often tracked bookings are reconciled against the backend.
pub const POLL_INTERVAL: Duration = Duration::from_millis(30_000);

struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Background loop driving `BookingTracker::check_booking_status_changes`.
///
/// Owned by whoever starts it; independent pollers do not share state.
pub struct BookingStatusPoller {
    tracker: Arc<BookingTracker>,
    interval: Duration,
    handle: Mutex<Option<PollerHandle>>,
}

impl BookingStatusPoller {
    pub fn new(tracker: Arc<BookingTracker>) -> Self {
        Self::with_interval(tracker, POLL_INTERVAL)
    }

    pub fn with_interval(tracker: Arc<BookingTracker>, interval: Duration) -> Self {
        Self {
            tracker,
            interval,
            handle: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        handle.as_ref().is_some_and(|h| !h.task.is_finished())
    }

    /// Start polling: one pass right away, then one per interval. No-op if already running.
    pub fn start(&self) {
        let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if handle.as_ref().is_some_and(|h| !h.task.is_finished()) {
            tracing::debug!("Booking status polling already running");
            return;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let tracker = self.tracker.clone();
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }

                // A pass in flight is allowed to finish after stop()
                let report = tracker.check_booking_status_changes().await;
                if !report.failures.is_empty() {
                    tracing::warn!(failed = report.failures.len(), "Booking status pass had failures");
                }

                if *shutdown_rx.borrow() {
                    break;
                }
            }

            tracing::info!("Booking status polling stopped");
        });

        tracing::info!("Booking status polling started (interval: {:?})", period);
        *handle = Some(PollerHandle { shutdown, task });
    }

    /// Stop scheduling further passes. No-op if not running.
    pub fn stop(&self) {
        let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(h) = handle.take() {
            let _ = h.shutdown.send(true);
        }
    }
}

impl Drop for BookingStatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
