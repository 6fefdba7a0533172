// src/services/booking_tracker.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing;

use crate::{
    errors::TrackerError as AppError,
    models::{
        booking::{BookingType, StatusFamily, StatusTransition, TrackedBooking},
        notification::NotificationType,
    },
    services::{
        notification_service::NotificationStore,
        status_client::BookingStatusSource,
        storage::{KeyValueStore, StoreKeys, get_json, set_json},
    },
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollFailure {
    pub booking_id: Option<i64>,
    pub error: String,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollReport {
    pub checked: usize,
    pub updated: usize,
    pub notified: usize,
    pub removed: usize,
    pub failures: Vec<PollFailure>,
}

impl PollReport {
    fn fail(&mut self, booking_id: Option<i64>, error: &AppError) {
        self.failures.push(PollFailure {
            booking_id,
            error: error.to_string(),
        });
    }
}

struct Observation {
    booking_id: i64,
    seen_checked: DateTime<Utc>,
    change: Change,
}

enum Change {
    Refresh { status: Option<String>, checked_at: DateTime<Utc> },
    Remove,
}

/// Title, message and type for the one notification sent when a booking is confirmed.
pub fn confirmation_copy(
    booking_type: BookingType,
    details: Option<&serde_json::Value>,
) -> (String, String, NotificationType) {
    let detail = |field: &str| {
        details
            .and_then(|d| d.get(field))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    match booking_type {
        BookingType::Ride => {
            let message = match detail("rideType") {
                Some(ride_type) => format!("Your {} ride has been confirmed. Your driver is on the way!", ride_type),
                None => "Your ride has been confirmed. Your driver is on the way!".to_string(),
            };
            ("Ride Confirmed! 🚗".to_string(), message, NotificationType::Ride)
        }
        BookingType::Service => {
            let service_name = detail("serviceName").unwrap_or_else(|| "service".to_string());
            (
                "Service Confirmed! ✅".to_string(),
                format!("Your {} booking has been confirmed.", service_name),
                NotificationType::Service,
            )
        }
    }
}

pub struct BookingTracker {
    store: Arc<dyn KeyValueStore>,
    status_source: Arc<dyn BookingStatusSource>,
    notifications: Arc<NotificationStore>,
    // Single writer for the tracked set
    write_lock: Mutex<()>,
}

impl BookingTracker {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        status_source: Arc<dyn BookingStatusSource>,
        notifications: Arc<NotificationStore>,
    ) -> Self {
        Self {
            store,
            status_source,
            notifications,
            write_lock: Mutex::new(()),
        }
    }

    async fn load_tracked(&self) -> Result<Vec<TrackedBooking>, AppError> {
        let tracked: Option<Vec<TrackedBooking>> = get_json(self.store.as_ref(), &StoreKeys::tracker()).await?;
        Ok(tracked.unwrap_or_default())
    }

    async fn save_tracked(&self, tracked: &[TrackedBooking]) -> Result<(), AppError> {
        set_json(self.store.as_ref(), &StoreKeys::tracker(), tracked).await?;
        Ok(())
    }

    async fn delete_side_keys(&self, booking_id: i64) {
        for key in [StoreKeys::booking_details(booking_id), StoreKeys::booking_customer(booking_id)] {
            if let Err(e) = self.store.delete(&key).await {
                tracing::warn!(booking_id, key = %key, error = %e, "Failed to delete booking side data");
            }
        }
    }

    /// Start tracking a booking, replacing any existing entry for the same id.
    ///
    /// Returns `false` when the booking is already terminal and was not tracked.
    pub async fn track_booking(
        &self,
        customer_id: &str,
        booking_id: i64,
        initial_status: &str,
        booking_type: BookingType,
        details: Option<serde_json::Value>,
    ) -> Result<bool, AppError> {
        if StatusFamily::of(initial_status) == StatusFamily::Terminal {
            tracing::info!(booking_id, status = initial_status, "Booking already terminal, not tracking");
            return Ok(false);
        }

        // Side keys change only under the write lock
        let _guard = self.write_lock.lock().await;

        if let Some(details) = &details {
            set_json(self.store.as_ref(), &StoreKeys::booking_details(booking_id), details).await?;
        }
        self.store.set(&StoreKeys::booking_customer(booking_id), customer_id).await?;

        let mut tracked = match self.load_tracked().await {
            Ok(tracked) => tracked,
            Err(AppError::StoreSerialization(e)) => {
                tracing::warn!(error = %e, "Discarding unreadable tracked booking set");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let entry = TrackedBooking::new(booking_id, initial_status, booking_type);
        match tracked.iter_mut().find(|b| b.booking_id == booking_id) {
            Some(existing) => {
                tracing::debug!(booking_id, "Booking already tracked, replacing entry");
                *existing = entry;
            }
            None => tracked.push(entry),
        }
        self.save_tracked(&tracked).await?;

        tracing::info!(booking_id, customer_id, status = initial_status, booking_type = %booking_type, "Tracking booking");
        Ok(true)
    }

    /// Stop tracking a booking and drop its side data. Returns whether it was tracked.
    pub async fn untrack_booking(&self, booking_id: i64) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut tracked = self.load_tracked().await?;
        let before = tracked.len();
        tracked.retain(|b| b.booking_id != booking_id);
        let removed = tracked.len() != before;
        if removed {
            self.save_tracked(&tracked).await?;
        }

        self.delete_side_keys(booking_id).await;
        Ok(removed)
    }

    pub async fn tracked_bookings(&self) -> Vec<TrackedBooking> {
        match self.load_tracked().await {
            Ok(tracked) => tracked,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read tracked bookings");
                Vec::new()
            }
        }
    }

    /// One reconciliation pass over every tracked booking.
    ///
    /// Fetches run one at a time. Results are applied to a fresh read of the
    /// tracked set, skipping entries that were re-registered while the pass ran.
    pub async fn check_booking_status_changes(&self) -> PollReport {
        let mut report = PollReport::default();

        let snapshot = match self.load_tracked().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load tracked bookings");
                report.fail(None, &e);
                return report;
            }
        };
        if snapshot.is_empty() {
            return report;
        }

        tracing::debug!(count = snapshot.len(), "Checking booking statuses");
        let mut observations = Vec::with_capacity(snapshot.len());

        for booking in &snapshot {
            report.checked += 1;

            let fetched = match self.status_source.fetch_status(booking.booking_id, booking.booking_type).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    // Left untouched; retried on the next tick
                    tracing::warn!(
                        booking_id = booking.booking_id,
                        transient = e.is_transient(),
                        error = %e,
                        "Booking status check failed"
                    );
                    report.fail(Some(booking.booking_id), &e);
                    continue;
                }
            };

            let change = match StatusTransition::evaluate(&booking.status, fetched.as_deref()) {
                StatusTransition::Confirmed(status) => {
                    match self.notify_confirmed(booking, &status).await {
                        Ok(()) => report.notified += 1,
                        Err(e) => {
                            tracing::warn!(booking_id = booking.booking_id, error = %e, "Confirmation notification not stored");
                            report.fail(Some(booking.booking_id), &e);
                        }
                    }
                    Change::Remove
                }
                StatusTransition::Terminal(status) => {
                    tracing::info!(booking_id = booking.booking_id, status = %status, "Booking reached terminal status");
                    Change::Remove
                }
                StatusTransition::Updated(status) => {
                    if status.is_none() {
                        tracing::debug!(booking_id = booking.booking_id, "Backend response carried no status");
                    }
                    Change::Refresh {
                        status,
                        checked_at: Utc::now(),
                    }
                }
            };

            observations.push(Observation {
                booking_id: booking.booking_id,
                seen_checked: booking.last_checked,
                change,
            });
        }

        if let Err(e) = self.apply(observations, &mut report).await {
            tracing::error!(error = %e, "Failed to persist tracked bookings");
            report.fail(None, &e);
        }

        tracing::debug!(
            checked = report.checked,
            notified = report.notified,
            removed = report.removed,
            failed = report.failures.len(),
            "Booking status check finished"
        );
        report
    }

    async fn apply(&self, observations: Vec<Observation>, report: &mut PollReport) -> Result<(), AppError> {
        if observations.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        let mut tracked = self.load_tracked().await?;
        let mut removed_ids = Vec::new();

        for observation in observations {
            let Some(index) = tracked.iter().position(|b| {
                b.booking_id == observation.booking_id && b.last_checked == observation.seen_checked
            }) else {
                tracing::debug!(booking_id = observation.booking_id, "Booking changed during poll, skipping");
                continue;
            };

            match observation.change {
                Change::Refresh { status, checked_at } => {
                    let entry = &mut tracked[index];
                    if let Some(status) = status {
                        entry.status = status;
                    }
                    entry.last_checked = checked_at;
                    report.updated += 1;
                }
                Change::Remove => {
                    tracked.remove(index);
                    removed_ids.push(observation.booking_id);
                }
            }
        }

        self.save_tracked(&tracked).await?;

        // Pruned side keys go before the guard drops
        for booking_id in &removed_ids {
            self.delete_side_keys(*booking_id).await;
        }
        report.removed = removed_ids.len();
        Ok(())
    }

    async fn notify_confirmed(&self, booking: &TrackedBooking, status: &str) -> Result<(), AppError> {
        let customer_id = self
            .store
            .get(&StoreKeys::booking_customer(booking.booking_id))
            .await?
            .ok_or(AppError::MissingCustomerId(booking.booking_id))?;

        let details: Option<serde_json::Value> =
            match get_json(self.store.as_ref(), &StoreKeys::booking_details(booking.booking_id)).await {
                Ok(details) => details,
                Err(e) => {
                    tracing::warn!(booking_id = booking.booking_id, error = %e, "Booking details unreadable");
                    None
                }
            };

        let (title, message, notification_type) = confirmation_copy(booking.booking_type, details.as_ref());
        let data = json!({
            "bookingId": booking.booking_id,
            "status": status,
            "bookingType": booking.booking_type,
            "details": details,
        });

        self.notifications
            .add_notification(&customer_id, &title, &message, notification_type, Some(data))
            .await?;

        tracing::info!(booking_id = booking.booking_id, customer_id = %customer_id, status, "Booking confirmed, customer notified");
        Ok(())
    }
}
