use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::services::storage::StoreError;

/// Main error type for the booking tracker service
#[derive(Debug)]
pub enum TrackerError {
    // HTTP and API errors
    BadRequest(String),
    NotFound(String),

    // Persistence errors
    StoreConnection(String),
    StoreOperation(String),
    StoreSerialization(String),

    // Backend (status source) errors
    NetworkTimeout,
    NetworkConnection(String),
    HttpClient(String),
    UnexpectedStatus { booking_id: i64, status: u16 },
    InvalidUrl(String),

    // Serialization and parsing errors
    JsonParsing(String),
    JsonSerialization(String),

    // Business logic errors
    InvalidBookingType(String),
    MissingCustomerId(i64),

    // Configuration and setup errors
    MissingEnvironmentVariable(String),
    InvalidConfiguration(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            TrackerError::NotFound(msg) => write!(f, "Not found: {}", msg),

            TrackerError::StoreConnection(msg) => write!(f, "Store connection error: {}", msg),
            TrackerError::StoreOperation(msg) => write!(f, "Store operation error: {}", msg),
            TrackerError::StoreSerialization(msg) => write!(f, "Store serialization error: {}", msg),

            TrackerError::NetworkTimeout => write!(f, "Network request timed out"),
            TrackerError::NetworkConnection(msg) => write!(f, "Network connection error: {}", msg),
            TrackerError::HttpClient(msg) => write!(f, "HTTP client error: {}", msg),
            TrackerError::UnexpectedStatus { booking_id, status } => {
                write!(f, "Backend returned {} for booking {}", status, booking_id)
            }
            TrackerError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),

            TrackerError::JsonParsing(msg) => write!(f, "JSON parsing error: {}", msg),
            TrackerError::JsonSerialization(msg) => write!(f, "JSON serialization error: {}", msg),

            TrackerError::InvalidBookingType(value) => write!(f, "Invalid booking type: {}", value),
            TrackerError::MissingCustomerId(id) => write!(f, "No customer id stored for booking {}", id),

            TrackerError::MissingEnvironmentVariable(var) => {
                write!(f, "Missing environment variable: {}", var)
            }
            TrackerError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for TrackerError {}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TrackerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            TrackerError::InvalidBookingType(_) => (StatusCode::BAD_REQUEST, "invalid_booking_type"),
            TrackerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),

            TrackerError::StoreConnection(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
            TrackerError::NetworkTimeout | TrackerError::NetworkConnection(_) => {
                (StatusCode::BAD_GATEWAY, "backend_unreachable")
            }
            TrackerError::UnexpectedStatus { .. } => (StatusCode::BAD_GATEWAY, "backend_error"),

            // All other errors are treated as internal server errors
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type TrackerResult<T> = Result<T, TrackerError>;

impl From<StoreError> for TrackerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(msg) => TrackerError::StoreConnection(msg),
            StoreError::Operation(msg) => TrackerError::StoreOperation(msg),
            StoreError::Serialization(msg) => TrackerError::StoreSerialization(msg),
        }
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TrackerError::NetworkTimeout
        } else if err.is_connect() {
            TrackerError::NetworkConnection(err.to_string())
        } else if err.is_decode() {
            TrackerError::JsonParsing(err.to_string())
        } else {
            TrackerError::HttpClient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            TrackerError::JsonParsing(err.to_string())
        } else {
            TrackerError::JsonSerialization(err.to_string())
        }
    }
}

// Helper functions for creating common errors
impl TrackerError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        TrackerError::BadRequest(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        TrackerError::NotFound(resource.into())
    }

    /// Transient failures are retried on the next poll tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TrackerError::NetworkTimeout
                | TrackerError::NetworkConnection(_)
                | TrackerError::HttpClient(_)
                | TrackerError::UnexpectedStatus { .. }
                | TrackerError::JsonParsing(_)
                | TrackerError::StoreConnection(_)
        )
    }
}
