// src/services/notification_service.rs
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing;

use crate::{
    errors::TrackerError as AppError,
    models::notification::{Notification, NotificationLog, NotificationType},
    services::storage::{KeyValueStore, StoreKeys, get_json, set_json},
};

/// Per-customer notification log backed by the key-value store.
pub struct NotificationStore {
    store: Arc<dyn KeyValueStore>,
    // Serializes read-modify-write cycles so concurrent adds never drop entries
    write_lock: Mutex<()>,
}

impl NotificationStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self, customer_id: &str) -> Result<NotificationLog, AppError> {
        let key = StoreKeys::notifications(customer_id);
        let entries: Option<Vec<Notification>> = get_json(self.store.as_ref(), &key).await?;
        Ok(NotificationLog::from_entries(entries.unwrap_or_default()))
    }

    async fn save(&self, customer_id: &str, log: &NotificationLog) -> Result<(), AppError> {
        let key = StoreKeys::notifications(customer_id);
        set_json(self.store.as_ref(), &key, log.entries()).await?;
        Ok(())
    }

    /// Prepend a notification to the customer's log, keeping the newest 50.
    ///
    /// An unreadable existing log is replaced rather than blocking new notifications.
    pub async fn add_notification(
        &self,
        customer_id: &str,
        title: &str,
        message: &str,
        notification_type: NotificationType,
        data: Option<serde_json::Value>,
    ) -> Result<Notification, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut log = match self.load(customer_id).await {
            Ok(log) => log,
            Err(AppError::StoreSerialization(e)) => {
                tracing::warn!(customer_id, error = %e, "Discarding unreadable notification log");
                NotificationLog::default()
            }
            Err(e) => return Err(e),
        };

        let notification = Notification::new(title, message, notification_type, data);
        log.push(notification.clone());
        self.save(customer_id, &log).await?;

        tracing::debug!(customer_id, notification_id = %notification.id, "Notification added");
        Ok(notification)
    }

    /// Number of unread notifications; 0 when the log is missing or unreadable.
    pub async fn unread_count(&self, customer_id: &str) -> usize {
        match self.load(customer_id).await {
            Ok(log) => log.unread_count(),
            Err(e) => {
                tracing::warn!(customer_id, error = %e, "Failed to read notifications, reporting 0 unread");
                0
            }
        }
    }

    pub async fn notifications(&self, customer_id: &str) -> Vec<Notification> {
        match self.load(customer_id).await {
            Ok(log) => log.into_entries(),
            Err(e) => {
                tracing::warn!(customer_id, error = %e, "Failed to read notifications");
                Vec::new()
            }
        }
    }

    pub async fn mark_read(&self, customer_id: &str, notification_id: &str) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut log = self.load(customer_id).await?;
        if !log.mark_read(notification_id) {
            return Ok(false);
        }
        self.save(customer_id, &log).await?;
        Ok(true)
    }

    pub async fn mark_all_read(&self, customer_id: &str) -> Result<usize, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut log = self.load(customer_id).await?;
        let changed = log.mark_all_read();
        if changed > 0 {
            self.save(customer_id, &log).await?;
        }
        Ok(changed)
    }

    pub async fn clear(&self, customer_id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;

        self.store.delete(&StoreKeys::notifications(customer_id)).await?;
        tracing::info!(customer_id, "Notifications cleared");
        Ok(())
    }
}
