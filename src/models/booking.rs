// src/models/booking.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TrackerError;

/// Statuses where the backend has accepted the booking and a driver/provider is on it.
pub const CONFIRMED_STATUSES: [&str; 4] = ["confirmed", "driver_assigned", "driver_arrived", "in_progress"];

pub const TERMINAL_STATUSES: [&str; 2] = ["completed", "cancelled"];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    Ride,
    Service,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Ride => "ride",
            BookingType::Service => "service",
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ride" => Ok(BookingType::Ride),
            "service" => Ok(BookingType::Service),
            other => Err(TrackerError::InvalidBookingType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFamily {
    Pending,   // Anything not confirmed and not terminal, including unknown values
    Confirmed, // Booking accepted by the backend
    Terminal,  // Booking finished one way or another
}

impl StatusFamily {
    pub fn of(status: &str) -> Self {
        if CONFIRMED_STATUSES.contains(&status) {
            StatusFamily::Confirmed
        } else if TERMINAL_STATUSES.contains(&status) {
            StatusFamily::Terminal
        } else {
            StatusFamily::Pending
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedBooking {
    pub booking_id: i64,
    pub status: String,
    #[serde(rename = "type")]
    pub booking_type: BookingType,
    pub last_checked: DateTime<Utc>,
}

impl TrackedBooking {
    pub fn new(booking_id: i64, status: impl Into<String>, booking_type: BookingType) -> Self {
        Self {
            booking_id,
            status: status.into(),
            booking_type,
            last_checked: Utc::now(),
        }
    }

    pub fn family(&self) -> StatusFamily {
        StatusFamily::of(&self.status)
    }
}

/// What a single poll decided for one tracked booking.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusTransition {
    /// First observation inside the confirmed family: notify, then stop tracking.
    Confirmed(String),
    /// Booking finished: stop tracking without notifying.
    Terminal(String),
    /// Keep tracking with the refreshed status (None when the backend omitted it).
    Updated(Option<String>),
}

impl StatusTransition {
    pub fn evaluate(previous: &str, fetched: Option<&str>) -> Self {
        let Some(fetched) = fetched else {
            return StatusTransition::Updated(None);
        };

        match (StatusFamily::of(previous), StatusFamily::of(fetched)) {
            (_, StatusFamily::Terminal) => StatusTransition::Terminal(fetched.to_string()),
            (StatusFamily::Confirmed, StatusFamily::Confirmed) => {
                StatusTransition::Updated(Some(fetched.to_string()))
            }
            (_, StatusFamily::Confirmed) => StatusTransition::Confirmed(fetched.to_string()),
            _ => StatusTransition::Updated(Some(fetched.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackBookingRequest {
    pub customer_id: String,
    pub booking_id: i64,
    pub status: String,
    #[serde(rename = "type")]
    pub booking_type: BookingType,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Minimal view of the backend booking payload.
#[derive(Debug, Deserialize)]
pub struct BookingStatusResponse {
    #[serde(default)]
    pub status: Option<String>,
}
