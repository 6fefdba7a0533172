// src/models/notification.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::id_generator::IdGenerator;

/// Maximum number of notifications kept per customer
pub const MAX_NOTIFICATIONS: usize = 50;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Booking,
    Ride,
    Service,
    #[default]
    General,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            NotificationType::Booking => "booking",
            NotificationType::Ride => "ride",
            NotificationType::Service => "service",
            NotificationType::General => "general",
        };
        write!(f, "{}", value)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: NotificationType,
        data: Option<serde_json::Value>,
    ) -> Self {
        let timestamp = Utc::now();
        Self {
            id: IdGenerator::notification_id(timestamp),
            title: title.into(),
            message: message.into(),
            notification_type,
            timestamp,
            read: false,
            data,
        }
    }
}

/// Newest-first notification log for a single customer.
#[derive(Debug, Default, Clone)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    pub fn from_entries(entries: Vec<Notification>) -> Self {
        let mut log = Self { entries };
        log.entries.truncate(MAX_NOTIFICATIONS);
        log
    }

    /// Insert at the head, evicting from the tail past the cap.
    pub fn push(&mut self, notification: Notification) {
        self.entries.insert(0, notification);
        self.entries.truncate(MAX_NOTIFICATIONS);
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    pub fn mark_read(&mut self, notification_id: &str) -> bool {
        match self.entries.iter_mut().find(|n| n.id == notification_id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for notification in self.entries.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        changed
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Notification> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(title: &str) -> Notification {
        Notification::new(title, "body", NotificationType::General, None)
    }

    #[test]
    fn test_push_is_newest_first_and_capped() {
        let mut log = NotificationLog::default();
        for i in 0..(MAX_NOTIFICATIONS + 1) {
            log.push(sample(&format!("n{}", i)));
        }

        assert_eq!(log.entries().len(), MAX_NOTIFICATIONS);
        assert_eq!(log.entries()[0].title, "n50");
        // n0 was evicted by the 51st insert
        assert_eq!(log.entries().last().unwrap().title, "n1");
    }

    #[test]
    fn test_mark_read() {
        let mut log = NotificationLog::default();
        log.push(sample("a"));
        log.push(sample("b"));
        let id = log.entries()[1].id.clone();

        assert!(log.mark_read(&id));
        assert!(!log.mark_read("missing"));
        assert_eq!(log.unread_count(), 1);
        assert_eq!(log.mark_all_read(), 1);
        assert_eq!(log.unread_count(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let notification = Notification::new(
            "Ride Confirmed! 🚗",
            "msg",
            NotificationType::Ride,
            Some(serde_json::json!({ "bookingId": 42 })),
        );
        let value = serde_json::to_value(&notification).unwrap();

        assert_eq!(value["type"], "ride");
        assert_eq!(value["read"], false);
        assert_eq!(value["data"]["bookingId"], 42);
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_read_defaults_to_false_when_missing() {
        let raw = r#"{"id":"1","title":"t","message":"m","type":"general","timestamp":"2025-01-01T00:00:00Z"}"#;
        let notification: Notification = serde_json::from_str(raw).unwrap();
        assert!(!notification.read);
        assert!(notification.data.is_none());
    }
}
