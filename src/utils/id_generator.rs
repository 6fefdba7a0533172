// src/utils/id_generator.rs
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_NOTIFICATION_ID: AtomicI64 = AtomicI64::new(0);

pub struct IdGenerator;

impl IdGenerator {
    /// Generate a notification id from the creation time in epoch milliseconds.
    /// Ids handed out by this process are strictly increasing, even when two
    /// notifications land in the same millisecond.
    pub fn notification_id(timestamp: DateTime<Utc>) -> String {
        let millis = timestamp.timestamp_millis();
        let mut last = LAST_NOTIFICATION_ID.load(Ordering::Relaxed);
        loop {
            let next = if millis > last { millis } else { last + 1 };
            match LAST_NOTIFICATION_ID.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed) {
                Ok(_) => return next.to_string(),
                Err(current) => last = current,
            }
        }
    }

    /// Recover the approximate creation time from a notification id
    pub fn parse_creation_time(id: &str) -> Option<DateTime<Utc>> {
        let millis = id.parse::<i64>().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}
